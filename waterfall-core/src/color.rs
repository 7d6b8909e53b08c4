//! Vertex colors

/// RGBA color with channels nominally in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`), alpha included
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Write this color into a flat RGBA slice
    #[inline]
    pub fn write_to(&self, out: &mut [f32]) {
        out[0] = self.r;
        out[1] = self.g;
        out[2] = self.b;
        out[3] = self.a;
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Color {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> [f32; 4] {
        [c.r, c.g, c.b, c.a]
    }
}

/// Rotate a colors hue by `degrees` around the grey axis
///
/// Alpha is left alone.
///
/// # Example
/// ```
/// # use waterfall_core::color::{rotate_hue, Color};
/// let mut c = Color::new(1.0, 0.0, 0.0, 1.0);
/// rotate_hue(&mut c, 120.0);
/// assert!((c.g - 1.0).abs() < 1e-5);
/// ```
pub fn rotate_hue(color: &mut Color, degrees: f32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let third = 1.0 / 3.0f32;

    let m_r = cos + (1.0 - cos) * third;
    let m_g = (1.0 - cos) * third - third.sqrt() * sin;
    let m_b = (1.0 - cos) * third + third.sqrt() * sin;

    let Color { r, g, b, .. } = *color;
    color.r = r * m_r + g * m_g + b * m_b;
    color.g = r * m_b + g * m_r + b * m_g;
    color.b = r * m_g + g * m_b + b * m_r;
}
