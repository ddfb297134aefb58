//! Typed, owner-scoped attribute storage.
//!
//! An attribute is a named data channel holding one fixed-size tuple per
//! element of its owner (point, vertex, primitive) or a single tuple for the
//! whole geometry (detail). Values are stored flat: tuple `i` occupies
//! components `i * tuple_size .. (i + 1) * tuple_size`.

use std::fmt;

use hgeo_math::{Color, IVec2, IVec3, Quat, SwapHandedness, Vec2, Vec3, Vec4};

use crate::error::{GeoError, GeoResult};
use crate::point::{FieldKind, FieldValue};

/// The element class an attribute is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeOwner {
    Vertex,
    Point,
    Primitive,
    /// One value for the whole geometry.
    Detail,
}

impl AttributeOwner {
    /// All owners, in the order they appear in a geometry file.
    pub const ALL: [AttributeOwner; 4] = [
        AttributeOwner::Vertex,
        AttributeOwner::Point,
        AttributeOwner::Primitive,
        AttributeOwner::Detail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeOwner::Vertex => "vertex",
            AttributeOwner::Point => "point",
            AttributeOwner::Primitive => "primitive",
            AttributeOwner::Detail => "detail",
        }
    }
}

impl fmt::Display for AttributeOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage class of an attribute's components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Integer,
    Float,
    String,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeType::Integer => "int",
            AttributeType::Float => "float",
            AttributeType::String => "string",
        })
    }
}

/// Flat component storage for one attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeData {
    Integer(Vec<i32>),
    Float(Vec<f32>),
    String(Vec<String>),
}

impl AttributeData {
    /// Create empty storage of the given type.
    pub fn new(attribute_type: AttributeType) -> Self {
        match attribute_type {
            AttributeType::Integer => AttributeData::Integer(Vec::new()),
            AttributeType::Float => AttributeData::Float(Vec::new()),
            AttributeType::String => AttributeData::String(Vec::new()),
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeData::Integer(_) => AttributeType::Integer,
            AttributeData::Float(_) => AttributeType::Float,
            AttributeData::String(_) => AttributeType::String,
        }
    }

    /// Number of scalar components (not tuples).
    pub fn component_count(&self) -> usize {
        match self {
            AttributeData::Integer(v) => v.len(),
            AttributeData::Float(v) => v.len(),
            AttributeData::String(v) => v.len(),
        }
    }

    fn push_default_components(&mut self, count: usize) {
        match self {
            AttributeData::Integer(v) => v.resize(v.len() + count, 0),
            AttributeData::Float(v) => v.resize(v.len() + count, 0.0),
            AttributeData::String(v) => v.resize(v.len() + count, String::new()),
        }
    }

    /// Move all components of `other` onto the end of `self`.
    ///
    /// Both sides must hold the same type.
    pub(crate) fn append(&mut self, other: AttributeData) {
        match (self, other) {
            (AttributeData::Integer(a), AttributeData::Integer(mut b)) => a.append(&mut b),
            (AttributeData::Float(a), AttributeData::Float(mut b)) => a.append(&mut b),
            (AttributeData::String(a), AttributeData::String(mut b)) => a.append(&mut b),
            _ => unreachable!("attribute data types are checked before appending"),
        }
    }

    /// Replace components starting at `start` with those of `other`.
    pub(crate) fn overwrite(&mut self, start: usize, other: AttributeData) {
        match (self, other) {
            (AttributeData::Integer(a), AttributeData::Integer(b)) => {
                a[start..start + b.len()].copy_from_slice(&b)
            }
            (AttributeData::Float(a), AttributeData::Float(b)) => {
                a[start..start + b.len()].copy_from_slice(&b)
            }
            (AttributeData::String(a), AttributeData::String(b)) => {
                for (slot, value) in a[start..].iter_mut().zip(b) {
                    *slot = value;
                }
            }
            _ => unreachable!("attribute data types are checked before overwriting"),
        }
    }
}

/// Convert a semantic field value into the components of a single tuple.
///
/// Flag sets have no attribute representation and yield `None`.
fn encode_value(value: &FieldValue, translate: bool) -> Option<AttributeData> {
    let data = match value {
        FieldValue::Bool(b) => AttributeData::Integer(vec![i32::from(*b)]),
        FieldValue::Int(v) => AttributeData::Integer(vec![*v]),
        FieldValue::Float(v) => AttributeData::Float(vec![*v]),
        FieldValue::String(s) => AttributeData::String(vec![s.clone()]),
        FieldValue::Vec2(v) => AttributeData::Float(v.to_array().to_vec()),
        FieldValue::Vec3(v) => {
            let v = if translate { v.swap_handedness() } else { *v };
            AttributeData::Float(v.to_array().to_vec())
        }
        FieldValue::Vec4(v) => AttributeData::Float(v.to_array().to_vec()),
        FieldValue::IVec2(v) => AttributeData::Integer(v.to_array().to_vec()),
        FieldValue::IVec3(v) => {
            let v = if translate { v.swap_handedness() } else { *v };
            AttributeData::Integer(v.to_array().to_vec())
        }
        FieldValue::Quat(q) => {
            let q = if translate { q.swap_handedness() } else { *q };
            AttributeData::Float(q.to_array().to_vec())
        }
        FieldValue::Color(c) => AttributeData::Float(c.to_rgb().to_vec()),
        FieldValue::Flags(_) => return None,
    };
    Some(data)
}

/// A named, typed, tuple-valued data channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    name: String,
    owner: AttributeOwner,
    tuple_size: usize,
    data: AttributeData,
}

impl Attribute {
    /// Create an empty attribute.
    ///
    /// # Panics
    ///
    /// Panics if `tuple_size` is zero.
    pub fn new(
        name: impl Into<String>,
        owner: AttributeOwner,
        attribute_type: AttributeType,
        tuple_size: usize,
    ) -> Self {
        assert!(tuple_size > 0, "attribute tuple size must be positive");
        Self {
            name: name.into(),
            owner,
            tuple_size,
            data: AttributeData::new(attribute_type),
        }
    }

    /// Create an attribute from existing flat data.
    ///
    /// Fails if the component count is not a whole number of tuples.
    pub fn with_data(
        name: impl Into<String>,
        owner: AttributeOwner,
        tuple_size: usize,
        data: AttributeData,
    ) -> GeoResult<Self> {
        let name = name.into();
        if tuple_size == 0 || data.component_count() % tuple_size != 0 {
            return Err(GeoError::ValueMismatch {
                attribute: name,
                expected: format!("{} components per tuple", tuple_size),
                found: "partial tuple",
            });
        }
        Ok(Self {
            name,
            owner,
            tuple_size,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> AttributeOwner {
        self.owner
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.data.attribute_type()
    }

    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    /// Raw flat storage.
    pub fn data(&self) -> &AttributeData {
        &self.data
    }

    /// Number of tuples stored.
    pub fn len(&self) -> usize {
        self.data.component_count() / self.tuple_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether this attribute has the given layout.
    pub fn matches_layout(&self, attribute_type: AttributeType, tuple_size: usize) -> bool {
        self.attribute_type() == attribute_type && self.tuple_size == tuple_size
    }

    /// Append `count` zero / empty-string tuples.
    pub fn push_defaults(&mut self, count: usize) {
        self.data.push_default_components(count * self.tuple_size);
    }

    /// Append one value, converted to this attribute's tuple layout.
    ///
    /// With `translate` set, 3D vectors and quaternions are mirrored from
    /// engine space into file space (see [`SwapHandedness`]).
    pub fn push_value(&mut self, value: &FieldValue, translate: bool) -> GeoResult<()> {
        let tuple = self.encode(value, translate)?;
        self.data.append(tuple);
        Ok(())
    }

    /// Replace the tuple at `index`.
    pub fn set_value(&mut self, index: usize, value: &FieldValue, translate: bool) -> GeoResult<()> {
        let count = self.len();
        if index >= count {
            return Err(GeoError::IndexOutOfRange {
                what: "tuple",
                index,
                count,
            });
        }
        let tuple = self.encode(value, translate)?;
        self.data.overwrite(index * self.tuple_size, tuple);
        Ok(())
    }

    /// Encode `value` as a single tuple for this attribute without storing it.
    pub(crate) fn encode(&self, value: &FieldValue, translate: bool) -> GeoResult<AttributeData> {
        match encode_value(value, translate) {
            Some(tuple)
                if tuple.attribute_type() == self.attribute_type()
                    && tuple.component_count() == self.tuple_size =>
            {
                Ok(tuple)
            }
            _ => Err(GeoError::ValueMismatch {
                attribute: self.name.clone(),
                expected: format!("{}[{}]", self.attribute_type(), self.tuple_size),
                found: value.kind_name(),
            }),
        }
    }

    /// Append tuples produced by [`Attribute::encode`].
    pub(crate) fn append_encoded(&mut self, tuples: AttributeData) {
        self.data.append(tuples);
    }

    /// Replace tuple `index` with a tuple produced by [`Attribute::encode`].
    pub(crate) fn overwrite_encoded(&mut self, index: usize, tuple: AttributeData) {
        self.data.overwrite(index * self.tuple_size, tuple);
    }

    /// Integer components of tuple `index`.
    pub fn int_tuple(&self, index: usize) -> Option<&[i32]> {
        match &self.data {
            AttributeData::Integer(v) => v.get(self.tuple_range(index)?),
            _ => None,
        }
    }

    /// Float components of tuple `index`.
    pub fn float_tuple(&self, index: usize) -> Option<&[f32]> {
        match &self.data {
            AttributeData::Float(v) => v.get(self.tuple_range(index)?),
            _ => None,
        }
    }

    /// String components of tuple `index`.
    pub fn string_tuple(&self, index: usize) -> Option<&[String]> {
        match &self.data {
            AttributeData::String(v) => v.get(self.tuple_range(index)?),
            _ => None,
        }
    }

    fn tuple_range(&self, index: usize) -> Option<std::ops::Range<usize>> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.tuple_size;
        Some(start..start + self.tuple_size)
    }

    /// Read tuple `index` back as a field value of the given kind.
    ///
    /// Returns `None` if the kind has no attribute layout, the layout does
    /// not match this attribute, or the index is out of range.
    pub fn value(&self, index: usize, kind: &FieldKind, translate: bool) -> Option<FieldValue> {
        let (attribute_type, tuple_size) = kind.layout()?;
        if !self.matches_layout(attribute_type, tuple_size) {
            return None;
        }

        let value = match kind {
            FieldKind::Bool => FieldValue::Bool(self.int_tuple(index)?[0] != 0),
            FieldKind::Int => FieldValue::Int(self.int_tuple(index)?[0]),
            FieldKind::Float => FieldValue::Float(self.float_tuple(index)?[0]),
            FieldKind::String => FieldValue::String(self.string_tuple(index)?[0].clone()),
            FieldKind::Vec2 => FieldValue::Vec2(Vec2::from_slice(self.float_tuple(index)?)),
            FieldKind::Vec3 => {
                let v = Vec3::from_slice(self.float_tuple(index)?);
                FieldValue::Vec3(if translate { v.swap_handedness() } else { v })
            }
            FieldKind::Vec4 => FieldValue::Vec4(Vec4::from_slice(self.float_tuple(index)?)),
            FieldKind::IVec2 => FieldValue::IVec2(IVec2::from_slice(self.int_tuple(index)?)),
            FieldKind::IVec3 => {
                let v = IVec3::from_slice(self.int_tuple(index)?);
                FieldValue::IVec3(if translate { v.swap_handedness() } else { v })
            }
            FieldKind::Quat => {
                let q = Quat::from_slice(self.float_tuple(index)?);
                FieldValue::Quat(if translate { q.swap_handedness() } else { q })
            }
            FieldKind::Color => {
                let c = self.float_tuple(index)?;
                FieldValue::Color(Color::from_rgb([c[0], c[1], c[2]]))
            }
            FieldKind::Flags(_) | FieldKind::Unsupported(_) => return None,
        };
        Some(value)
    }
}
