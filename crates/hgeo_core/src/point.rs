//! Point-record schema contract.
//!
//! Any type can be written to a geometry as points by describing its fields
//! up front: each field has a name, a [`FieldKind`] that decides the
//! attribute layout, and a [`FieldScope`]. Per-instance fields become point
//! attributes; static fields become a single detail attribute. A field
//! named `groups` or `grouping` holding a flag set drives point-group
//! membership instead of producing an attribute.
//!
//! The [`point_record!`](crate::point_record) and
//! [`point_flags!`](crate::point_flags) macros generate the boilerplate:
//!
//! ```ignore
//! use hgeo_core::{point_flags, point_record};
//! use hgeo_math::Vec3;
//!
//! point_flags! {
//!     pub struct TreeGroups { None = 0, Pine = 1, Oak = 2 }
//! }
//!
//! #[derive(Default)]
//! struct TreePoint {
//!     p: Vec3,
//!     height: f32,
//!     groups: TreeGroups,
//! }
//!
//! point_record!(TreePoint { p as "P": Vec3, height: f32, groups: TreeGroups });
//! ```

use hgeo_math::{Color, IVec2, IVec3, Quat, Vec2, Vec3, Vec4};

use crate::attribute::AttributeType;

/// Field names reserved for group membership.
pub const GROUP_FIELD_NAMES: [&str; 2] = ["groups", "grouping"];

/// A named set of bit flags, the equivalent of a flags enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagSet {
    pub name: &'static str,
    pub flags: &'static [(&'static str, i32)],
}

impl FlagSet {
    /// Flags that map to a point group.
    ///
    /// A flag qualifies if its value is strictly positive and it is not a
    /// composite, i.e. its bits are not exactly the union of other declared
    /// flags that are strict subsets of it.
    pub fn group_flags(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.flags
            .iter()
            .copied()
            .filter(move |&(_, value)| value > 0 && !self.is_composite(value))
    }

    fn is_composite(&self, value: i32) -> bool {
        let covered = self
            .flags
            .iter()
            .map(|&(_, v)| v)
            .filter(|&v| v > 0 && v != value && v & value == v)
            .fold(0, |acc, v| acc | v);
        covered == value
    }
}

/// Semantic type of a record field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    Quat,
    Color,
    /// A flag set; only meaningful as a group field.
    Flags(&'static FlagSet),
    /// A type with no attribute mapping. Such fields are skipped.
    Unsupported(&'static str),
}

impl FieldKind {
    /// Attribute type and tuple size for this kind, if it has one.
    pub fn layout(&self) -> Option<(AttributeType, usize)> {
        let layout = match self {
            FieldKind::Bool | FieldKind::Int => (AttributeType::Integer, 1),
            FieldKind::Float => (AttributeType::Float, 1),
            FieldKind::String => (AttributeType::String, 1),
            FieldKind::Vec2 => (AttributeType::Float, 2),
            FieldKind::Vec3 => (AttributeType::Float, 3),
            FieldKind::Vec4 | FieldKind::Quat => (AttributeType::Float, 4),
            FieldKind::IVec2 => (AttributeType::Integer, 2),
            FieldKind::IVec3 => (AttributeType::Integer, 3),
            FieldKind::Color => (AttributeType::Float, 3),
            FieldKind::Flags(_) | FieldKind::Unsupported(_) => return None,
        };
        Some(layout)
    }
}

/// Whether a field varies per record or is shared by the record type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldScope {
    Instance,
    Static,
}

/// Description of one record field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, used verbatim as the attribute name
    pub name: &'static str,

    /// Semantic type
    pub kind: FieldKind,

    /// Per-record or shared
    pub scope: FieldScope,
}

impl FieldDescriptor {
    /// A per-record field.
    pub const fn instance(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            scope: FieldScope::Instance,
        }
    }

    /// A field shared by every record of the type.
    pub const fn shared(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            scope: FieldScope::Static,
        }
    }

    /// Check if this field is reserved for group membership.
    pub fn is_group_field(&self) -> bool {
        GROUP_FIELD_NAMES.contains(&self.name)
    }
}

/// Field layout of a point-record type.
#[derive(Debug)]
pub struct PointSchema {
    /// Record type name, used to detect mixed batches
    pub name: &'static str,

    /// Declared fields in declaration order
    pub fields: &'static [FieldDescriptor],
}

impl PointSchema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields reserved for group membership. A valid record declares at
    /// most one.
    pub fn group_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|f| f.is_group_field())
    }
}

/// The value of one record field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    Quat(Quat),
    Color(Color),
    Flags(i32),
}

impl FieldValue {
    /// Short name of the value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Vec2(_) => "vec2",
            FieldValue::Vec3(_) => "vec3",
            FieldValue::Vec4(_) => "vec4",
            FieldValue::IVec2(_) => "ivec2",
            FieldValue::IVec3(_) => "ivec3",
            FieldValue::Quat(_) => "quat",
            FieldValue::Color(_) => "color",
            FieldValue::Flags(_) => "flags",
        }
    }
}

/// A Rust type usable as a record field.
pub trait FieldType: Sized {
    /// The field kind this type maps to.
    const KIND: FieldKind;

    fn to_field_value(&self) -> FieldValue;

    fn from_field_value(value: FieldValue) -> Option<Self>;
}

macro_rules! impl_field_type {
    ($ty:ty, $kind:ident, |$v:ident| $to:expr) => {
        impl FieldType for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn to_field_value(&self) -> FieldValue {
                let $v = self;
                FieldValue::$kind($to)
            }

            fn from_field_value(value: FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$kind(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_field_type!(bool, Bool, |v| *v);
impl_field_type!(i32, Int, |v| *v);
impl_field_type!(f32, Float, |v| *v);
impl_field_type!(String, String, |v| v.clone());
impl_field_type!(Vec2, Vec2, |v| *v);
impl_field_type!(Vec3, Vec3, |v| *v);
impl_field_type!(Vec4, Vec4, |v| *v);
impl_field_type!(IVec2, IVec2, |v| *v);
impl_field_type!(IVec3, IVec3, |v| *v);
impl_field_type!(Quat, Quat, |v| *v);
impl_field_type!(Color, Color, |v| *v);

/// A record that can be written to (and read from) a geometry as a point.
pub trait PointRecord {
    /// The record type's field layout.
    fn schema(&self) -> &'static PointSchema;

    /// Current value of a declared field.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Assign a declared field. Returns `false` if the field is unknown or
    /// the value has the wrong kind.
    fn set_field(&mut self, name: &str, value: FieldValue) -> bool;
}

impl<T: PointRecord + ?Sized> PointRecord for Box<T> {
    fn schema(&self) -> &'static PointSchema {
        (**self).schema()
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        (**self).field(name)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        (**self).set_field(name, value)
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __point_field_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $name:literal) => {
        $name
    };
}

/// Implement [`PointRecord`] for a struct from a list of its fields.
///
/// Each entry is `field: Type` or `field as "AttrName": Type`, optionally
/// prefixed with `static` to declare a field shared by every record of the
/// type (written once as a detail attribute). Every field type must
/// implement [`FieldType`].
#[macro_export]
macro_rules! point_record {
    ($ty:ident { $($body:tt)* }) => {
        $crate::__point_record!(@parse $ty [] $($body)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __point_record {
    (@parse $ty:ident [$($acc:tt)*]
        static $field:ident $(as $attr:literal)? : $fty:ty $(, $($rest:tt)*)?) => {
        $crate::__point_record!(@parse $ty [$($acc)* (shared $field [$($attr)?] $fty)] $($($rest)*)?);
    };
    (@parse $ty:ident [$($acc:tt)*]
        $field:ident $(as $attr:literal)? : $fty:ty $(, $($rest:tt)*)?) => {
        $crate::__point_record!(@parse $ty [$($acc)* (instance $field [$($attr)?] $fty)] $($($rest)*)?);
    };
    (@parse $ty:ident [$($acc:tt)*]) => {
        $crate::__point_record!(@emit $ty $($acc)*);
    };
    (@emit $ty:ident $(($scope:ident $field:ident [$($attr:literal)?] $fty:ty))*) => {
        impl $crate::point::PointRecord for $ty {
            fn schema(&self) -> &'static $crate::point::PointSchema {
                static SCHEMA: $crate::point::PointSchema = $crate::point::PointSchema {
                    name: stringify!($ty),
                    fields: &[
                        $($crate::point::FieldDescriptor::$scope(
                            $crate::__point_field_name!($field $(, $attr)?),
                            <$fty as $crate::point::FieldType>::KIND,
                        ),)*
                    ],
                };
                &SCHEMA
            }

            fn field(&self, name: &str) -> Option<$crate::point::FieldValue> {
                $(
                    if name == $crate::__point_field_name!($field $(, $attr)?) {
                        return Some($crate::point::FieldType::to_field_value(&self.$field));
                    }
                )*
                None
            }

            fn set_field(&mut self, name: &str, value: $crate::point::FieldValue) -> bool {
                $(
                    if name == $crate::__point_field_name!($field $(, $attr)?) {
                        return match <$fty as $crate::point::FieldType>::from_field_value(value) {
                            Some(v) => {
                                self.$field = v;
                                true
                            }
                            None => false,
                        };
                    }
                )*
                let _ = value;
                false
            }
        }
    };
}

/// Declare a flag-set newtype usable as a `groups` field.
///
/// Every single (non-composite) flag with a strictly positive value becomes
/// a point group of the same name when records are added to a geometry.
#[macro_export]
macro_rules! point_flags {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($flag:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        $vis struct $name(pub i32);

        #[allow(non_upper_case_globals)]
        impl $name {
            $(pub const $flag: Self = Self($value);)*

            /// Names and values of every flag.
            pub const FLAG_SET: &'static $crate::point::FlagSet = &$crate::point::FlagSet {
                name: stringify!($name),
                flags: &[$((stringify!($flag), $value)),*],
            };

            /// Check that every bit of `other` is set.
            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn bits(self) -> i32 {
                self.0
            }
        }

        impl ::std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl $crate::point::FieldType for $name {
            const KIND: $crate::point::FieldKind = $crate::point::FieldKind::Flags(Self::FLAG_SET);

            fn to_field_value(&self) -> $crate::point::FieldValue {
                $crate::point::FieldValue::Flags(self.0)
            }

            fn from_field_value(value: $crate::point::FieldValue) -> Option<Self> {
                match value {
                    $crate::point::FieldValue::Flags(bits) => Some(Self(bits)),
                    _ => None,
                }
            }
        }
    };
}

/// The minimal point: a position and nothing else.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointData {
    /// Position
    pub p: Vec3,
}

impl PointData {
    pub fn new(p: Vec3) -> Self {
        Self { p }
    }
}

crate::point_record!(PointData { p as "P": Vec3 });

#[cfg(test)]
mod tests {
    use super::*;

    crate::point_flags! {
        struct Layers { None = 0, Ground = 1, Water = 2, Both = 3 }
    }

    #[derive(Default)]
    struct Marker {
        p: Vec3,
        label: String,
        layers: Layers,
    }

    crate::point_record!(Marker { p as "P": Vec3, label: String, layers: Layers });

    #[test]
    fn test_layout_table() {
        assert_eq!(FieldKind::Bool.layout(), Some((AttributeType::Integer, 1)));
        assert_eq!(FieldKind::Quat.layout(), Some((AttributeType::Float, 4)));
        assert_eq!(FieldKind::Color.layout(), Some((AttributeType::Float, 3)));
        assert_eq!(FieldKind::IVec3.layout(), Some((AttributeType::Integer, 3)));
        assert_eq!(FieldKind::Unsupported("Mat4").layout(), None);
        assert_eq!(FieldKind::Flags(Layers::FLAG_SET).layout(), None);
    }

    #[test]
    fn test_macro_schema() {
        let marker = Marker::default();
        let schema = marker.schema();
        assert_eq!(schema.name, "Marker");
        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.fields[0].name, "P");
        assert_eq!(schema.fields[1].kind, FieldKind::String);
        assert!(schema.group_fields().next().is_none());
    }

    #[derive(Default)]
    struct Survey {
        p: Vec3,
        source: String,
    }

    crate::point_record!(Survey { p as "P": Vec3, static source: String });

    #[test]
    fn test_macro_static_field() {
        let survey = Survey {
            p: Vec3::Z,
            source: "lidar".into(),
        };
        let schema = survey.schema();
        assert_eq!(schema.fields[0].scope, FieldScope::Instance);
        assert_eq!(schema.fields[1], FieldDescriptor::shared("source", FieldKind::String));
        assert_eq!(survey.field("source"), Some(FieldValue::String("lidar".into())));
    }

    #[test]
    fn test_macro_get_and_set() {
        let mut marker = Marker::default();
        assert!(marker.set_field("P", FieldValue::Vec3(Vec3::X)));
        assert!(marker.set_field("label", FieldValue::String("dock".into())));
        assert!(!marker.set_field("label", FieldValue::Float(1.0)));
        assert!(!marker.set_field("missing", FieldValue::Int(1)));

        assert_eq!(marker.p, Vec3::X);
        assert_eq!(marker.field("label"), Some(FieldValue::String("dock".into())));
        assert_eq!(marker.field("layers"), Some(FieldValue::Flags(0)));
    }

    #[test]
    fn test_flag_set() {
        let flags: Vec<_> = Layers::FLAG_SET.group_flags().collect();
        // Both = Ground | Water is a composite and gets no group of its own
        assert_eq!(flags, vec![("Ground", 1), ("Water", 2)]);

        let both = Layers::Ground | Layers::Water;
        assert!(both.contains(Layers::Water));
        assert!(both.contains(Layers::Both));
        assert!(!Layers::Ground.contains(Layers::Both));
    }

    #[test]
    fn test_group_field_names() {
        assert!(FieldDescriptor::instance("groups", FieldKind::Int).is_group_field());
        assert!(FieldDescriptor::instance("grouping", FieldKind::Int).is_group_field());
        assert!(!FieldDescriptor::instance("group", FieldKind::Int).is_group_field());
    }

    #[test]
    fn test_boxed_record_forwards() {
        let boxed: Box<dyn PointRecord> = Box::new(PointData::new(Vec3::Y));
        assert_eq!(boxed.schema().name, "PointData");
        assert_eq!(boxed.field("P"), Some(FieldValue::Vec3(Vec3::Y)));
    }
}
