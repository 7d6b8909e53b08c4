use glium::glutin::surface::WindowSurface;
use glium::Surface;
use waterfall_core::mesh::Mesh;

macro_rules! shader_program {
    // {{{
    ($display:expr, $vert_file:expr, $frag_file:expr) => {{
        // Use this for debug
        #[cfg(debug_assertions)]
        {
            let read = |file: &str| {
                let path = format!("{}/src/{}", env!("CARGO_MANIFEST_DIR"), file);
                std::fs::read_to_string(&path)
                    .unwrap_or_else(|e| panic!("Can't read shader {}: {}", path, e))
            };

            glium::Program::from_source($display, &read($vert_file), &read($frag_file), None)
                .expect("Can't compile shader")
        }

        // Use this for release
        #[cfg(not(debug_assertions))]
        glium::Program::from_source(
            $display,
            include_str!($vert_file),
            include_str!($frag_file),
            None,
        )
        .expect("Can't compile shader")
    }};
} // }}}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    position: [f32; 3],
    normal: [f32; 3],
    color: [f32; 4],
}

glium::implement_vertex!(Geometry, position, normal, color);

#[derive(Copy, Clone, Debug)]
pub struct Uv {
    uv: [f32; 2],
}

glium::implement_vertex!(Uv, uv);

/// Everything that changes per frame, in vertex buffer layout
pub fn interleave(mesh: &Mesh, out: &mut Vec<Geometry>) {
    out.clear();
    out.extend(
        mesh.positions
            .chunks_exact(3)
            .zip(mesh.normals.chunks_exact(3))
            .zip(mesh.colors.chunks_exact(4))
            .map(|((p, n), c)| Geometry {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
                color: [c[0], c[1], c[2], c[3]],
            }),
    );
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: na::Point3<f32>,
    pub target: na::Point3<f32>,
    pub light_direction: [f32; 3],
    pub ambient: f32,
}

impl Camera {
    pub fn from_config() -> Camera {
        let position: [f32; 3] =
            waterfall_core::CONFIG.get_or("waterfall.camera.position", [0.0, 24.0, -40.0]);
        let target: [f32; 3] =
            waterfall_core::CONFIG.get_or("waterfall.camera.target", [0.0, 0.0, 64.0]);

        Camera {
            position: position.into(),
            target: target.into(),
            light_direction: waterfall_core::CONFIG
                .get_or("waterfall.light.direction", [0.3, -1.0, 0.5]),
            ambient: waterfall_core::CONFIG.get_or("waterfall.light.ambient", 0.35),
        }
    }

    fn view(&self) -> na::Matrix4<f32> {
        na::Matrix4::look_at_rh(&self.position, &self.target, &na::Vector3::y())
    }
}

pub struct Renderer {
    program: glium::Program,
    camera: Camera,
    generation: u64,
    geometry: Option<glium::VertexBuffer<Geometry>>,
    uvs: Option<glium::VertexBuffer<Uv>>,
    indices: Option<glium::IndexBuffer<u32>>,
    scratch: Vec<Geometry>,
}

impl Renderer {
    pub fn new(display: &glium::Display<WindowSurface>, camera: Camera) -> Renderer {
        Renderer {
            program: shader_program!(display, "shaders/waterfall.vert", "shaders/waterfall.frag"),
            camera,
            generation: 0,
            geometry: None,
            uvs: None,
            indices: None,
            scratch: Vec::new(),
        }
    }

    /// Bring GPU buffers up to date with `mesh`
    ///
    /// Positions, normals and colors are written every frame, UVs and indices only after the
    /// mesh was rebuilt.
    fn upload(&mut self, display: &glium::Display<WindowSurface>, mesh: &Mesh) {
        interleave(mesh, &mut self.scratch);

        match self.geometry {
            Some(ref geometry) if self.generation == mesh.generation() => {
                geometry.write(&self.scratch);
            }
            _ => {
                let uvs = mesh
                    .uvs
                    .chunks_exact(2)
                    .map(|uv| Uv { uv: [uv[0], uv[1]] })
                    .collect::<Vec<_>>();

                self.geometry = Some(
                    glium::VertexBuffer::dynamic(display, &self.scratch)
                        .expect("Can't create vertex buffer"),
                );
                self.uvs =
                    Some(glium::VertexBuffer::new(display, &uvs).expect("Can't create uv buffer"));
                self.indices = if mesh.indices.is_empty() {
                    None
                } else {
                    Some(
                        glium::IndexBuffer::new(
                            display,
                            glium::index::PrimitiveType::TrianglesList,
                            &mesh.indices,
                        )
                        .expect("Can't create index buffer"),
                    )
                };
                self.generation = mesh.generation();

                debug!(
                    "Uploaded mesh generation {}: {} vertices, {} indices",
                    self.generation,
                    self.scratch.len(),
                    mesh.indices.len()
                );
            }
        }
    }

    pub fn draw(&mut self, display: &glium::Display<WindowSurface>, mesh: &Mesh) {
        self.upload(display, mesh);

        let mut target = display.draw();
        target.clear_color_and_depth((0.0, 0.0, 0.0, 1.0), 1.0);

        if let (Some(geometry), Some(uvs), Some(indices)) = (&self.geometry, &self.uvs, &self.indices)
        {
            let (width, height) = target.get_dimensions();
            let aspect = width as f32 / height.max(1) as f32;

            let perspective =
                na::Matrix4::new_perspective(aspect, std::f32::consts::FRAC_PI_4, 0.1, 1000.0);
            let view = self.camera.view();
            let model = na::Matrix4::<f32>::identity();

            let uniforms = uniform! {
                perspective_matrix: Into::<[[f32; 4]; 4]>::into(perspective),
                view_matrix: Into::<[[f32; 4]; 4]>::into(view),
                model_matrix: Into::<[[f32; 4]; 4]>::into(model),
                light_direction: self.camera.light_direction,
                ambient: self.camera.ambient,
            };

            let draw_params = glium::DrawParameters {
                depth: glium::Depth {
                    test: glium::DepthTest::IfLessOrEqual,
                    write: true,
                    ..Default::default()
                },
                blend: glium::Blend::alpha_blending(),
                ..Default::default()
            };

            target
                .draw((geometry, uvs), indices, &self.program, &uniforms, &draw_params)
                .expect("Draw failed");
        }

        target.finish().expect("Can't swap buffers");
    }
}
