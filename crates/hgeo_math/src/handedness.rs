// Handedness conversion between engine space and geometry-file space.
//
// Both spaces are Y-up; the engine is left-handed and the file is
// right-handed. Mirroring across the YZ plane maps one onto the other, and
// applying it twice is the identity, so the same call converts either way.

use glam::{IVec3, Quat, Vec3};

/// Mirror a value across the YZ plane.
pub trait SwapHandedness {
    /// Convert between left-handed and right-handed Y-up space.
    fn swap_handedness(self) -> Self;
}

impl SwapHandedness for Vec3 {
    fn swap_handedness(self) -> Self {
        Vec3::new(-self.x, self.y, self.z)
    }
}

impl SwapHandedness for IVec3 {
    fn swap_handedness(self) -> Self {
        IVec3::new(-self.x, self.y, self.z)
    }
}

impl SwapHandedness for Quat {
    fn swap_handedness(self) -> Self {
        // Reflecting the basis flips the rotation direction about Y and Z.
        Quat::from_xyzw(self.x, -self.y, -self.z, self.w)
    }
}
