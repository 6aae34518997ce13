/// Straight-alpha RGBA color.
///
/// Values are written to the framebuffer as-is; the default surface is non-sRGB,
/// so no transfer function is applied.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Dark teal used as the background of the quad scene.
    #[inline]
    pub const fn dark_teal() -> Self {
        Self::new(0.2, 0.3, 0.3, 1.0)
    }
}

impl From<ColorRgba> for wgpu::Color {
    fn from(c: ColorRgba) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}
