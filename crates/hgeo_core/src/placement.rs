//! Placement capability for points that describe object instances.

use hgeo_math::{Quat, Vec3};

use crate::scene::Transform;

/// A point that says which prototype to place and how.
///
/// This is separate from [`PointRecord`](crate::point::PointRecord): the
/// population driver only needs placement data, while ingestion only needs
/// the field schema.
pub trait Placement {
    /// Position in container space.
    fn position(&self) -> Vec3;

    /// Name of the prototype to place, optionally with leading directories.
    fn prototype_name(&self) -> &str;

    /// Uniform scale factor.
    fn pscale(&self) -> f32;

    /// Per-axis scale.
    fn scale(&self) -> Vec3;

    fn orient(&self) -> Quat;

    /// Local transform of an instance placed at this point.
    ///
    /// Scale is `scale * pscale`.
    fn transform(&self) -> Transform {
        Transform {
            translation: self.position(),
            rotation: self.orient(),
            scale: self.scale() * self.pscale(),
        }
    }
}

/// A point carrying everything needed to place a prototype on it.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulatablePoint {
    pub p: Vec3,
    pub name: String,
    pub pscale: f32,
    pub scale: Vec3,
    pub orient: Quat,
}

impl Default for PopulatablePoint {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            name: String::new(),
            pscale: 1.0,
            scale: Vec3::ONE,
            orient: Quat::IDENTITY,
        }
    }
}

impl PopulatablePoint {
    pub fn new(p: Vec3, name: impl Into<String>) -> Self {
        Self {
            p,
            name: name.into(),
            ..Default::default()
        }
    }
}

crate::point_record!(PopulatablePoint {
    p as "P": Vec3,
    name: String,
    pscale: f32,
    scale: Vec3,
    orient: Quat,
});

impl Placement for PopulatablePoint {
    fn position(&self) -> Vec3 {
        self.p
    }

    fn prototype_name(&self) -> &str {
        &self.name
    }

    fn pscale(&self) -> f32 {
        self.pscale
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn orient(&self) -> Quat {
        self.orient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoContainer;

    #[test]
    fn test_defaults() {
        let point = PopulatablePoint::default();
        assert_eq!(point.pscale, 1.0);
        assert_eq!(point.scale, Vec3::ONE);
        assert_eq!(point.orient, Quat::IDENTITY);
    }

    #[test]
    fn test_transform_combines_scales() {
        let point = PopulatablePoint {
            pscale: 2.0,
            scale: Vec3::new(1.0, 0.5, 3.0),
            ..PopulatablePoint::new(Vec3::Y, "Tree")
        };
        let transform = point.transform();
        assert_eq!(transform.translation, Vec3::Y);
        assert_eq!(transform.scale, Vec3::new(2.0, 1.0, 6.0));
    }

    #[test]
    fn test_round_trip_through_geometry() {
        let points = vec![
            PopulatablePoint {
                orient: Quat::from_rotation_y(0.5),
                pscale: 0.5,
                ..PopulatablePoint::new(Vec3::new(1.0, 2.0, 3.0), "Props/Rock")
            },
            PopulatablePoint::new(Vec3::new(-2.0, 0.0, 1.0), "Tree"),
        ];

        let mut geo = GeoContainer::new();
        geo.add_points(&points, true).unwrap();
        let back: Vec<PopulatablePoint> = geo.points(true);

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].name, "Props/Rock");
        assert!((back[0].p - points[0].p).length() < 0.001);
        assert!((back[0].orient.dot(points[0].orient) - 1.0).abs() < 0.001);
        assert_eq!(back[1].pscale, 1.0);
    }
}
