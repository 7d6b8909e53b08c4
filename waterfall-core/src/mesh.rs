//! Waterfall mesh geometry
//!
//! All buffers are flat, vertex `i` of a `bins x length` grid lives at `x + z * bins` where `x` is
//! the frequency bin and `z` the age of the window.
use nalgebra as na;

/// CPU side mesh, uploaded by the renderer every frame
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
    generation: u64,
}

impl Mesh {
    pub fn new() -> Mesh {
        Default::default()
    }

    /// Reallocate all buffers for a new grid size
    ///
    /// Positions and normals are zeroed and colors are filled with `fill`.  UVs and triangles
    /// are generated right away.
    pub fn rebuild(&mut self, bins: usize, length: usize, fill: f32) {
        let area = bins * length;

        self.positions = vec![0.0; 3 * area];
        self.normals = vec![0.0; 3 * area];
        self.colors = vec![fill; 4 * area];
        self.uvs = calculate_uvs(bins, length);
        self.indices = calculate_triangles(bins, length);
        self.generation += 1;

        log::debug!(
            "Mesh rebuilt: {} x {} ({} vertices, {} triangles, generation {})",
            bins,
            length,
            area,
            self.indices.len() / 3,
            self.generation,
        );
    }

    /// Counter which is increased on each rebuild
    ///
    /// Renderers only need to upload UVs and indices when this changes.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn recalculate_normals(&mut self) {
        calculate_normals(&self.positions, &self.indices, &mut self.normals);
    }
}

/// UV coordinate for each vertex
pub fn calculate_uvs(bins: usize, length: usize) -> Vec<f32> {
    let mut uvs = vec![0.0; 2 * bins * length];

    for z in 0..length {
        for x in 0..bins {
            let i = x + z * bins;
            uvs[2 * i] = x as f32 / bins as f32;
            uvs[2 * i + 1] = 1.0 - z as f32 / length as f32;
        }
    }

    uvs
}

/// Two triangles for each quad of the grid
pub fn calculate_triangles(bins: usize, length: usize) -> Vec<u32> {
    let mut triangles =
        Vec::with_capacity(bins.saturating_sub(1) * length.saturating_sub(1) * 6);

    for z in 0..length.saturating_sub(1) {
        for x in 0..bins.saturating_sub(1) {
            let a = (z * bins + x) as u32;
            let b = ((z + 1) * bins + x) as u32;

            triangles.extend_from_slice(&[a + 1, b, a, b, a + 1, b + 1]);
        }
    }

    triangles
}

/// Smooth vertex normals
///
/// Each face adds its unit normal to all three of its vertices, the sums are normalized
/// afterwards.  Degenerate faces are skipped and vertices without any face end up with a zero
/// normal.
pub fn calculate_normals(positions: &[f32], indices: &[u32], normals: &mut [f32]) {
    debug_assert_eq!(positions.len(), normals.len());

    for n in normals.iter_mut() {
        *n = 0.0;
    }

    let vertex = |i: usize| na::Vector3::new(positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]);

    for face in indices.chunks_exact(3) {
        let (i1, i2, i3) = (face[0] as usize, face[1] as usize, face[2] as usize);
        let p1 = vertex(i1);

        let face_normal = match (vertex(i2) - p1).cross(&(vertex(i3) - p1)).try_normalize(1e-12) {
            Some(n) => n,
            None => continue,
        };

        for i in &[i1, i2, i3] {
            normals[3 * i] += face_normal.x;
            normals[3 * i + 1] += face_normal.y;
            normals[3 * i + 2] += face_normal.z;
        }
    }

    for n in normals.chunks_exact_mut(3) {
        if let Some(unit) = na::Vector3::new(n[0], n[1], n[2]).try_normalize(1e-12) {
            n[0] = unit.x;
            n[1] = unit.y;
            n[2] = unit.z;
        }
    }
}
