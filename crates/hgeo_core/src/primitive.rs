//! Primitive records: polygons and NURBS curves.

/// Order of the curves built from splines (cubic).
pub const CUBIC_ORDER: u32 = 4;

/// A polygon (or open polyline) over a run of vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyPrimitive {
    /// Vertex indices in winding order
    pub vertices: Vec<usize>,

    /// Closed polygon, or open polyline
    pub closed: bool,
}

/// A NURBS curve over a run of vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct NurbCurvePrimitive {
    /// Vertex indices, first control point first
    pub vertices: Vec<usize>,

    /// Curve order (degree + 1)
    pub order: u32,

    /// Whether the curve interpolates its end points
    pub end_interpolation: bool,

    /// Knot vector
    pub knots: Vec<f32>,

    /// Closed (periodic) curve
    pub closed: bool,
}

impl NurbCurvePrimitive {
    /// Build a clamped uniform cubic curve over `vertices`.
    pub fn cubic(vertices: Vec<usize>, closed: bool) -> Self {
        let knots = clamped_uniform_knots(vertices.len(), CUBIC_ORDER);
        Self {
            vertices,
            order: CUBIC_ORDER,
            end_interpolation: true,
            knots,
            closed,
        }
    }
}

/// A topological element built from an ordered run of vertices.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Poly(PolyPrimitive),
    NurbCurve(NurbCurvePrimitive),
}

impl Primitive {
    /// Vertex indices used by this primitive.
    pub fn vertices(&self) -> &[usize] {
        match self {
            Primitive::Poly(poly) => &poly.vertices,
            Primitive::NurbCurve(curve) => &curve.vertices,
        }
    }

    /// Type name as written in geometry files.
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Poly(_) => "Poly",
            Primitive::NurbCurve(_) => "NURBCurve",
        }
    }
}

/// Knot vector for a clamped curve with uniformly spaced breakpoints.
///
/// Breakpoint `i` is repeated `order` times at both ends and `order - 1`
/// times in between, with `2 + (n - order) / (order - 1)` breakpoints for
/// `n` control points (truncating division). `order` must be at least 2.
pub fn clamped_uniform_knots(point_count: usize, order: u32) -> Vec<f32> {
    debug_assert!(order >= 2, "curve order must be at least 2");

    let order = i64::from(order);
    let knot_count = 2 + (point_count as i64 - order) / (order - 1);

    let mut knots = Vec::new();
    for i in 0..knot_count {
        let multiplicity = if i == 0 || i == knot_count - 1 {
            order
        } else {
            order - 1
        };
        knots.extend(std::iter::repeat(i as f32).take(multiplicity as usize));
    }
    knots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knots_five_points() {
        let knots = clamped_uniform_knots(5, 4);
        assert_eq!(knots, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_knots_seven_points() {
        // 2 + 3 / 3 = 3 breakpoints, interior one repeated order - 1 times
        let knots = clamped_uniform_knots(7, 4);
        assert_eq!(
            knots,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]
        );
        assert_eq!(knots.len(), 7 + 4);
    }

    #[test]
    fn test_knots_fewer_points_than_order() {
        // (2 - 4) / 3 truncates to 0
        let knots = clamped_uniform_knots(2, 4);
        assert_eq!(knots, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_cubic_curve() {
        let curve = NurbCurvePrimitive::cubic(vec![3, 4, 5, 6], false);
        assert_eq!(curve.order, 4);
        assert!(curve.end_interpolation);
        assert_eq!(curve.knots.len(), 8);

        let prim = Primitive::NurbCurve(curve);
        assert_eq!(prim.vertices(), &[3, 4, 5, 6]);
        assert_eq!(prim.type_name(), "NURBCurve");
    }
}
