use bytemuck::{Pod, Zeroable};

/// Linear RGBA color.
///
/// Geometry files only carry the RGB part (`Cd` is a 3-tuple), so alpha
/// is dropped on export and restored as opaque on import.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Create a color from all four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Create an opaque color from an `[r, g, b]` triple.
    pub fn from_rgb(rgb: [f32; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }

    /// The RGB channels as an array.
    pub fn to_rgb(self) -> [f32; 3] {
        let [r, g, b, _] = self.to_array();
        [r, g, b]
    }

    /// All four channels as an array.
    pub fn to_array(self) -> [f32; 4] {
        bytemuck::cast(self)
    }
}
