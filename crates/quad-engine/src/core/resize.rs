use crate::coords::Viewport;
use crate::driver::GraphicsDriver;

/// Resize handler: the viewport follows the framebuffer, anchored at the origin.
pub fn framebuffer_size_callback<D>(driver: &mut D, width: u32, height: u32)
where
    D: GraphicsDriver + ?Sized,
{
    driver.set_viewport(Viewport::from_size(width, height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDriver;

    #[test]
    fn viewport_takes_the_new_extent() {
        let mut driver = MockDriver::new();
        framebuffer_size_callback(&mut driver, 1024, 768);
        assert_eq!(driver.viewport(), Viewport::new(0, 0, 1024, 768));
    }

    #[test]
    fn repeated_calls_are_idempotent() {
        let mut driver = MockDriver::new();
        framebuffer_size_callback(&mut driver, 640, 480);
        let first = driver.viewport();
        framebuffer_size_callback(&mut driver, 640, 480);
        assert_eq!(driver.viewport(), first);
        assert_eq!(first, Viewport::from_size(640, 480));
    }

    #[test]
    fn zero_size_is_recorded_as_is() {
        let mut driver = MockDriver::new();
        framebuffer_size_callback(&mut driver, 0, 0);
        assert!(driver.viewport().is_empty());
    }
}
