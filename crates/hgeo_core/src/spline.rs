//! Spline records: ordered point runs that become NURBS curves.

use crate::point::PointRecord;

/// An ordered sequence of points with an open/closed flag.
///
/// Splines are not stored as such; [`GeoContainer::add_splines`] turns each
/// one into points, vertices and a cubic NURBS curve primitive.
///
/// [`GeoContainer::add_splines`]: crate::geometry::GeoContainer::add_splines
pub trait SplineRecord {
    /// The spline's control points, first to last.
    fn point_records(&self) -> Vec<&dyn PointRecord>;

    fn is_closed(&self) -> bool;
}

impl<T: SplineRecord + ?Sized> SplineRecord for Box<T> {
    fn point_records(&self) -> Vec<&dyn PointRecord> {
        (**self).point_records()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// A spline over one point-record type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplineData<P> {
    pub points: Vec<P>,
    pub closed: bool,
}

impl<P> SplineData<P> {
    pub fn new(points: Vec<P>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// An open spline.
    pub fn open(points: Vec<P>) -> Self {
        Self::new(points, false)
    }
}

impl<P: PointRecord> SplineRecord for SplineData<P> {
    fn point_records(&self) -> Vec<&dyn PointRecord> {
        self.points.iter().map(|p| p as &dyn PointRecord).collect()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
