// Re-export glam for convenience
pub use glam::*;

// HGEO math types
mod bounds;
pub use bounds::Bounds;

mod color;
pub use color::Color;

mod handedness;
pub use handedness::SwapHandedness;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_color_reexport() {
        let c = Color::rgb(0.25, 0.5, 1.0);
        assert_eq!(c.to_rgb(), [0.25, 0.5, 1.0]);
    }
}
