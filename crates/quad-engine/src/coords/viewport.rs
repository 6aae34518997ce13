/// Rectangular region of the drawable surface that rendering output maps onto.
///
/// Expressed in physical pixels. `x`/`y` are the origin, `width`/`height` the extent.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport anchored at the origin covering `width` x `height` pixels.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersects the viewport with a `surface_width` x `surface_height` target.
    ///
    /// Returns `(x, y, w, h)` as floats for a render pass, or `None` when nothing
    /// of the viewport lies on the target.
    pub fn clamp_to(self, surface_width: u32, surface_height: u32) -> Option<(f32, f32, f32, f32)> {
        let x0 = i64::from(self.x).clamp(0, i64::from(surface_width));
        let y0 = i64::from(self.y).clamp(0, i64::from(surface_height));
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(surface_width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(surface_height));

        let w = x1 - x0;
        let h = y1 - y0;
        if w <= 0 || h <= 0 {
            None
        } else {
            Some((x0 as f32, y0 as f32, w as f32, h as f32))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_size_is_origin_anchored() {
        assert_eq!(Viewport::from_size(800, 600), Viewport::new(0, 0, 800, 600));
    }

    #[test]
    fn empty_when_any_extent_is_zero() {
        assert!(Viewport::from_size(0, 600).is_empty());
        assert!(Viewport::from_size(800, 0).is_empty());
        assert!(!Viewport::from_size(1, 1).is_empty());
    }

    #[test]
    fn clamp_inside_target_is_identity() {
        let v = Viewport::from_size(800, 600);
        assert_eq!(v.clamp_to(800, 600), Some((0.0, 0.0, 800.0, 600.0)));
    }

    #[test]
    fn clamp_larger_than_target_is_cut() {
        let v = Viewport::from_size(1920, 1080);
        assert_eq!(v.clamp_to(800, 600), Some((0.0, 0.0, 800.0, 600.0)));
    }

    #[test]
    fn clamp_negative_origin() {
        let v = Viewport::new(-100, -50, 300, 200);
        assert_eq!(v.clamp_to(800, 600), Some((0.0, 0.0, 200.0, 150.0)));
    }

    #[test]
    fn clamp_outside_target_is_none() {
        assert!(Viewport::new(900, 0, 100, 100).clamp_to(800, 600).is_none());
        assert!(Viewport::from_size(0, 0).clamp_to(800, 600).is_none());
    }
}
