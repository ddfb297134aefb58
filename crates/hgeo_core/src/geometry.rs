//! The geometry container.
//!
//! A [`GeoContainer`] holds points, vertices (references from primitives to
//! points), primitives, groups and the attribute store. Every attribute
//! holds exactly one tuple per element of its owner; detail attributes
//! hold exactly one tuple. All growth goes through methods that keep this
//! invariant.

use std::ops::Range;

use hgeo_math::Vec3;

use crate::attribute::{Attribute, AttributeOwner, AttributeType};
use crate::error::{GeoError, GeoResult};
use crate::group::{Group, GroupType};
use crate::primitive::{NurbCurvePrimitive, PolyPrimitive, Primitive};

/// Name of the point position attribute.
pub const POSITION_ATTRIBUTE: &str = "P";

/// Name of the point normal attribute.
pub const NORMAL_ATTRIBUTE: &str = "N";

/// Points, topology, groups and attributes of one geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoContainer {
    point_count: usize,

    /// Point index of each vertex
    point_refs: Vec<usize>,

    primitives: Vec<Primitive>,

    /// Unique by (name, owner), ordered by owner then creation
    attributes: Vec<Attribute>,

    point_groups: Vec<Group>,

    primitive_groups: Vec<Group>,
}

impl GeoContainer {
    /// Create an empty geometry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn vertex_count(&self) -> usize {
        self.point_refs.len()
    }

    pub fn prim_count(&self) -> usize {
        self.primitives.len()
    }

    /// Number of tuples an attribute of `owner` must hold.
    pub fn element_count(&self, owner: AttributeOwner) -> usize {
        match owner {
            AttributeOwner::Vertex => self.vertex_count(),
            AttributeOwner::Point => self.point_count,
            AttributeOwner::Primitive => self.prim_count(),
            AttributeOwner::Detail => 1,
        }
    }

    /// Point index referenced by each vertex.
    pub fn point_refs(&self) -> &[usize] {
        &self.point_refs
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Polygon primitives, in primitive order.
    pub fn poly_primitives(&self) -> impl Iterator<Item = &PolyPrimitive> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Poly(poly) => Some(poly),
            _ => None,
        })
    }

    /// NURBS curve primitives, in primitive order.
    pub fn nurb_curve_primitives(&self) -> impl Iterator<Item = &NurbCurvePrimitive> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::NurbCurve(curve) => Some(curve),
            _ => None,
        })
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// All attributes: vertex, point, primitive, then detail.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attributes of one owner, in creation order.
    pub fn attributes_of(&self, owner: AttributeOwner) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(move |a| a.owner() == owner)
    }

    pub fn attribute(&self, name: &str, owner: AttributeOwner) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.owner() == owner && a.name() == name)
    }

    pub fn attribute_mut(&mut self, name: &str, owner: AttributeOwner) -> Option<&mut Attribute> {
        self.attributes
            .iter_mut()
            .find(|a| a.owner() == owner && a.name() == name)
    }

    /// Position that keeps attributes ordered by owner, then by creation.
    fn insertion_index(&self, owner: AttributeOwner) -> usize {
        self.attributes
            .iter()
            .position(|a| a.owner() > owner)
            .unwrap_or(self.attributes.len())
    }

    /// Fail if `name` exists on `owner` with a different layout.
    ///
    /// Returns whether the attribute already exists.
    pub fn check_attribute_layout(
        &self,
        name: &str,
        owner: AttributeOwner,
        attribute_type: AttributeType,
        tuple_size: usize,
    ) -> GeoResult<bool> {
        match self.attribute(name, owner) {
            None => Ok(false),
            Some(existing) if existing.matches_layout(attribute_type, tuple_size) => Ok(true),
            Some(existing) => Err(GeoError::SchemaConflict {
                name: name.to_string(),
                owner,
                existing_type: existing.attribute_type(),
                existing_size: existing.tuple_size(),
                requested_type: attribute_type,
                requested_size: tuple_size,
            }),
        }
    }

    /// Return the attribute `name` on `owner`, creating it if needed.
    ///
    /// A new attribute gets a default tuple for every existing element of
    /// its owner. Fails with [`GeoError::SchemaConflict`] if the attribute
    /// exists with another type or tuple size.
    pub fn get_or_create_attribute(
        &mut self,
        name: &str,
        attribute_type: AttributeType,
        tuple_size: usize,
        owner: AttributeOwner,
    ) -> GeoResult<&mut Attribute> {
        let existing = self
            .attributes
            .iter()
            .position(|a| a.owner() == owner && a.name() == name);
        let index = match existing {
            Some(index) => {
                self.check_attribute_layout(name, owner, attribute_type, tuple_size)?;
                index
            }
            None => {
                // Backfill every element that already exists so later growth
                // never leaves gaps.
                let mut attribute = Attribute::new(name, owner, attribute_type, tuple_size);
                attribute.push_defaults(self.element_count(owner));
                let index = self.insertion_index(owner);
                self.attributes.insert(index, attribute);
                index
            }
        };
        Ok(&mut self.attributes[index])
    }

    /// Insert a fully populated attribute.
    ///
    /// The attribute must hold one tuple per element of its owner and must
    /// not collide with an existing (name, owner) pair.
    pub fn add_attribute(&mut self, attribute: Attribute) -> GeoResult<()> {
        let owner = attribute.owner();
        if let Some(existing) = self.attribute(attribute.name(), owner) {
            return Err(GeoError::SchemaConflict {
                name: attribute.name().to_string(),
                owner,
                existing_type: existing.attribute_type(),
                existing_size: existing.tuple_size(),
                requested_type: attribute.attribute_type(),
                requested_size: attribute.tuple_size(),
            });
        }

        let expected = self.element_count(owner);
        if attribute.len() != expected {
            return Err(GeoError::CountMismatch {
                name: attribute.name().to_string(),
                owner,
                expected,
                actual: attribute.len(),
            });
        }

        let index = self.insertion_index(owner);
        self.attributes.insert(index, attribute);
        Ok(())
    }

    /// Point positions from the `P` attribute, or the origin for every
    /// point if there is none.
    pub fn positions(&self) -> Vec<Vec3> {
        self.vec3_values(POSITION_ATTRIBUTE, AttributeOwner::Point)
            .unwrap_or_else(|| vec![Vec3::ZERO; self.point_count])
    }

    /// Values of a float[3] attribute as vectors, without any coordinate
    /// translation.
    pub fn vec3_values(&self, name: &str, owner: AttributeOwner) -> Option<Vec<Vec3>> {
        let attribute = self.attribute(name, owner)?;
        if !attribute.matches_layout(AttributeType::Float, 3) {
            return None;
        }
        (0..attribute.len())
            .map(|i| attribute.float_tuple(i).map(Vec3::from_slice))
            .collect()
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    /// Append `count` points and return their index range.
    ///
    /// Every point attribute receives a default tuple per new point.
    /// Attributes meant to carry values for these points should be created
    /// before calling this, since creation backfills based on the current
    /// count.
    pub fn add_point_block(&mut self, count: usize) -> Range<usize> {
        let start = self.point_count;
        self.point_count += count;
        for attribute in self
            .attributes
            .iter_mut()
            .filter(|a| a.owner() == AttributeOwner::Point)
        {
            attribute.push_defaults(count);
        }
        start..self.point_count
    }

    /// Raise the point count without touching attributes.
    ///
    /// Callers must bring every point attribute back in step, see
    /// [`GeoContainer::pad_point_attributes`].
    pub(crate) fn grow_point_count(&mut self, count: usize) {
        self.point_count += count;
    }

    /// Give every point attribute default tuples up to the point count.
    pub(crate) fn pad_point_attributes(&mut self) {
        let point_count = self.point_count;
        for attribute in self
            .attributes
            .iter_mut()
            .filter(|a| a.owner() == AttributeOwner::Point)
        {
            if attribute.len() < point_count {
                attribute.push_defaults(point_count - attribute.len());
            }
        }
    }

    /// Append a vertex referencing `point` and return its index.
    pub fn add_vertex(&mut self, point: usize) -> GeoResult<usize> {
        if point >= self.point_count {
            return Err(GeoError::IndexOutOfRange {
                what: "point",
                index: point,
                count: self.point_count,
            });
        }

        self.point_refs.push(point);
        for attribute in self
            .attributes
            .iter_mut()
            .filter(|a| a.owner() == AttributeOwner::Vertex)
        {
            attribute.push_defaults(1);
        }
        Ok(self.point_refs.len() - 1)
    }

    /// Append a primitive over existing vertices and return its index.
    pub fn add_primitive(&mut self, primitive: Primitive) -> GeoResult<usize> {
        let vertex_count = self.vertex_count();
        if let Some(&bad) = primitive.vertices().iter().find(|&&v| v >= vertex_count) {
            return Err(GeoError::IndexOutOfRange {
                what: "vertex",
                index: bad,
                count: vertex_count,
            });
        }

        self.primitives.push(primitive);
        for attribute in self
            .attributes
            .iter_mut()
            .filter(|a| a.owner() == AttributeOwner::Primitive)
        {
            attribute.push_defaults(1);
        }
        Ok(self.primitives.len() - 1)
    }

    /// Add a polygon over existing points, one new vertex per point.
    pub fn add_polygon(&mut self, points: &[usize], closed: bool) -> GeoResult<usize> {
        if let Some(&bad) = points.iter().find(|&&p| p >= self.point_count) {
            return Err(GeoError::IndexOutOfRange {
                what: "point",
                index: bad,
                count: self.point_count,
            });
        }

        let vertices = points
            .iter()
            .map(|&p| self.add_vertex(p))
            .collect::<GeoResult<Vec<_>>>()?;
        self.add_primitive(Primitive::Poly(PolyPrimitive { vertices, closed }))
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub fn point_groups(&self) -> &[Group] {
        &self.point_groups
    }

    pub fn primitive_groups(&self) -> &[Group] {
        &self.primitive_groups
    }

    /// Find a group by name and type.
    pub fn group(&self, name: &str, group_type: GroupType) -> Option<&Group> {
        self.groups(group_type).iter().find(|g| g.name == name)
    }

    fn groups(&self, group_type: GroupType) -> &[Group] {
        match group_type {
            GroupType::Points => &self.point_groups,
            GroupType::Primitives => &self.primitive_groups,
        }
    }

    /// Create a group, or merge `members` into an existing group of the
    /// same name and type.
    pub fn add_group(
        &mut self,
        name: &str,
        group_type: GroupType,
        members: impl IntoIterator<Item = usize>,
    ) -> GeoResult<()> {
        let (count, what) = match group_type {
            GroupType::Points => (self.point_count, "point"),
            GroupType::Primitives => (self.prim_count(), "primitive"),
        };

        let members: Vec<usize> = members.into_iter().collect();
        if let Some(&bad) = members.iter().find(|&&id| id >= count) {
            return Err(GeoError::IndexOutOfRange {
                what,
                index: bad,
                count,
            });
        }

        let groups = match group_type {
            GroupType::Points => &mut self.point_groups,
            GroupType::Primitives => &mut self.primitive_groups,
        };
        let group = match groups.iter().position(|g| g.name == name) {
            Some(index) => &mut groups[index],
            None => {
                groups.push(Group::new(name));
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        group.ids.extend(members);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check every structural invariant.
    ///
    /// Used after decoding, where the data did not pass through the
    /// growth methods.
    pub fn validate(&self) -> GeoResult<()> {
        for attribute in &self.attributes {
            let expected = self.element_count(attribute.owner());
            if attribute.len() != expected {
                return Err(GeoError::CountMismatch {
                    name: attribute.name().to_string(),
                    owner: attribute.owner(),
                    expected,
                    actual: attribute.len(),
                });
            }
        }

        for (i, a) in self.attributes.iter().enumerate() {
            if let Some(b) = self.attributes[i + 1..]
                .iter()
                .find(|b| b.owner() == a.owner() && b.name() == a.name())
            {
                return Err(GeoError::SchemaConflict {
                    name: a.name().to_string(),
                    owner: a.owner(),
                    existing_type: a.attribute_type(),
                    existing_size: a.tuple_size(),
                    requested_type: b.attribute_type(),
                    requested_size: b.tuple_size(),
                });
            }
        }

        if let Some(&bad) = self.point_refs.iter().find(|&&p| p >= self.point_count) {
            return Err(GeoError::IndexOutOfRange {
                what: "point",
                index: bad,
                count: self.point_count,
            });
        }

        let vertex_count = self.vertex_count();
        for primitive in &self.primitives {
            if let Some(&bad) = primitive.vertices().iter().find(|&&v| v >= vertex_count) {
                return Err(GeoError::IndexOutOfRange {
                    what: "vertex",
                    index: bad,
                    count: vertex_count,
                });
            }
        }

        for (groups, count, what) in [
            (&self.point_groups, self.point_count, "point"),
            (&self.primitive_groups, self.prim_count(), "primitive"),
        ] {
            for group in groups {
                if let Some(&bad) = group.ids.range(count..).next() {
                    return Err(GeoError::IndexOutOfRange {
                        what,
                        index: bad,
                        count,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::FieldValue;

    #[test]
    fn test_empty_geometry() {
        let geo = GeoContainer::new();
        assert_eq!(geo.point_count(), 0);
        assert_eq!(geo.vertex_count(), 0);
        assert_eq!(geo.prim_count(), 0);
        assert_eq!(geo.element_count(AttributeOwner::Detail), 1);
        assert!(geo.validate().is_ok());
    }

    #[test]
    fn test_new_attribute_backfills() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(5);

        let attr = geo
            .get_or_create_attribute("Cd", AttributeType::Float, 3, AttributeOwner::Point)
            .unwrap();
        assert_eq!(attr.len(), 5);
        assert_eq!(attr.float_tuple(4), Some(&[0.0, 0.0, 0.0][..]));
    }

    #[test]
    fn test_get_or_create_reuses() {
        let mut geo = GeoContainer::new();
        geo.get_or_create_attribute("id", AttributeType::Integer, 1, AttributeOwner::Point)
            .unwrap();
        geo.get_or_create_attribute("id", AttributeType::Integer, 1, AttributeOwner::Point)
            .unwrap();
        // Same name on another owner is a separate attribute
        geo.get_or_create_attribute("id", AttributeType::Integer, 1, AttributeOwner::Detail)
            .unwrap();
        assert_eq!(geo.attributes().len(), 2);
    }

    #[test]
    fn test_attributes_ordered_by_owner() {
        let mut geo = GeoContainer::new();
        geo.get_or_create_attribute("name", AttributeType::String, 1, AttributeOwner::Detail)
            .unwrap();
        geo.get_or_create_attribute("P", AttributeType::Float, 3, AttributeOwner::Point)
            .unwrap();
        geo.get_or_create_attribute("uv", AttributeType::Float, 2, AttributeOwner::Vertex)
            .unwrap();
        geo.get_or_create_attribute("pscale", AttributeType::Float, 1, AttributeOwner::Point)
            .unwrap();

        let order: Vec<_> = geo.attributes().iter().map(|a| a.name()).collect();
        assert_eq!(order, vec!["uv", "P", "pscale", "name"]);
    }

    #[test]
    fn test_get_or_create_conflict() {
        let mut geo = GeoContainer::new();
        geo.get_or_create_attribute("id", AttributeType::Integer, 1, AttributeOwner::Point)
            .unwrap();
        let err = geo
            .get_or_create_attribute("id", AttributeType::Float, 1, AttributeOwner::Point)
            .unwrap_err();
        assert!(matches!(err, GeoError::SchemaConflict { .. }));

        let err = geo
            .get_or_create_attribute("id", AttributeType::Integer, 2, AttributeOwner::Point)
            .unwrap_err();
        assert!(matches!(err, GeoError::SchemaConflict { requested_size: 2, .. }));
    }

    #[test]
    fn test_point_block_extends_attributes() {
        let mut geo = GeoContainer::new();
        geo.get_or_create_attribute("P", AttributeType::Float, 3, AttributeOwner::Point)
            .unwrap();
        let range = geo.add_point_block(3);
        assert_eq!(range, 0..3);
        let range = geo.add_point_block(2);
        assert_eq!(range, 3..5);
        assert_eq!(geo.attribute("P", AttributeOwner::Point).unwrap().len(), 5);
        assert!(geo.validate().is_ok());
    }

    #[test]
    fn test_add_polygon() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(4);
        geo.get_or_create_attribute("uv", AttributeType::Float, 2, AttributeOwner::Vertex)
            .unwrap();
        geo.get_or_create_attribute("shop", AttributeType::String, 1, AttributeOwner::Primitive)
            .unwrap();

        let prim = geo.add_polygon(&[0, 1, 2, 3], true).unwrap();
        assert_eq!(prim, 0);
        assert_eq!(geo.vertex_count(), 4);
        assert_eq!(geo.point_refs(), &[0, 1, 2, 3]);
        assert_eq!(geo.poly_primitives().count(), 1);
        assert_eq!(geo.attribute("uv", AttributeOwner::Vertex).unwrap().len(), 4);
        assert_eq!(geo.attribute("shop", AttributeOwner::Primitive).unwrap().len(), 1);
        assert!(geo.validate().is_ok());
    }

    #[test]
    fn test_add_polygon_rejects_bad_point() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(2);
        let err = geo.add_polygon(&[0, 1, 2], true).unwrap_err();
        assert!(matches!(err, GeoError::IndexOutOfRange { index: 2, .. }));
        assert_eq!(geo.vertex_count(), 0);
    }

    #[test]
    fn test_add_group_merges() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(4);
        geo.add_group("edge", GroupType::Points, [0, 1]).unwrap();
        geo.add_group("edge", GroupType::Points, [1, 3]).unwrap();

        assert_eq!(geo.point_groups().len(), 1);
        let group = geo.group("edge", GroupType::Points).unwrap();
        assert_eq!(group.ids.iter().copied().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert!(geo.group("edge", GroupType::Primitives).is_none());
    }

    #[test]
    fn test_add_group_rejects_out_of_range() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(2);
        let err = geo.add_group("far", GroupType::Points, [5]).unwrap_err();
        assert!(matches!(err, GeoError::IndexOutOfRange { index: 5, count: 2, .. }));
        assert!(geo.point_groups().is_empty());
    }

    #[test]
    fn test_add_attribute_checks_length() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(2);

        let mut attr = Attribute::new("w", AttributeOwner::Point, AttributeType::Float, 1);
        attr.push_defaults(1);
        assert!(matches!(
            geo.add_attribute(attr.clone()),
            Err(GeoError::CountMismatch { expected: 2, actual: 1, .. })
        ));

        attr.push_value(&FieldValue::Float(1.0), false).unwrap();
        geo.add_attribute(attr.clone()).unwrap();
        assert!(matches!(
            geo.add_attribute(attr),
            Err(GeoError::SchemaConflict { .. })
        ));
    }

    #[test]
    fn test_positions_default_to_origin() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(2);
        assert_eq!(geo.positions(), vec![Vec3::ZERO, Vec3::ZERO]);
    }
}
