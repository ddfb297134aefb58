//! Point and spline ingestion.
//!
//! Ingestion derives attributes from a record type's schema, appends one
//! tuple per record, turns a flag-set `groups` field into point groups and,
//! for splines, synthesizes vertices and cubic NURBS curve primitives.
//!
//! Both entry points are all-or-nothing: every record is validated and every
//! value encoded before the container is touched, so an error leaves the
//! geometry exactly as it was.

use std::ops::Range;

use crate::attribute::{Attribute, AttributeData, AttributeOwner, AttributeType};
use crate::error::{GeoError, GeoResult};
use crate::geometry::GeoContainer;
use crate::group::GroupType;
use crate::point::{FieldDescriptor, FieldKind, FieldScope, FieldValue, FlagSet, PointRecord};
use crate::primitive::{NurbCurvePrimitive, Primitive};
use crate::spline::SplineRecord;

/// Values for one attribute, encoded but not yet stored.
struct StagedAttribute {
    name: &'static str,
    owner: AttributeOwner,
    attribute_type: AttributeType,
    tuple_size: usize,
    values: AttributeData,
}

/// Membership of the new points in one flag group.
struct StagedGroup {
    name: &'static str,
    members: Vec<usize>,
}

impl GeoContainer {
    /// Append a homogeneous batch of point records.
    ///
    /// Returns the index range of the new points. See
    /// [`GeoContainer::add_point_records`].
    pub fn add_points<P: PointRecord>(
        &mut self,
        points: &[P],
        translate: bool,
    ) -> GeoResult<Range<usize>> {
        let records: Vec<&dyn PointRecord> = points.iter().map(|p| p as &dyn PointRecord).collect();
        self.add_point_records(&records, translate)
    }

    /// Append a batch of type-erased point records.
    ///
    /// All records must share one schema. Per-instance fields become point
    /// attributes, static fields become detail attributes (overwritten by
    /// each batch), and a flag-set `groups` field becomes point groups.
    /// Fields with no attribute layout are skipped.
    pub fn add_point_records(
        &mut self,
        records: &[&dyn PointRecord],
        translate: bool,
    ) -> GeoResult<Range<usize>> {
        let Some(first) = records.first() else {
            return Ok(self.point_count()..self.point_count());
        };

        let schema = first.schema();
        for (index, record) in records.iter().enumerate() {
            let found = record.schema();
            if !std::ptr::eq(schema, found) {
                return Err(GeoError::MixedRecordTypes {
                    expected: schema.name,
                    found: found.name,
                    index,
                });
            }
        }

        let mut group_fields = schema.group_fields();
        let group_field = group_fields.next();
        if let (Some(first), Some(second)) = (group_field, group_fields.next()) {
            return Err(GeoError::DuplicateGroupsField {
                record: schema.name,
                first: first.name,
                second: second.name,
            });
        }

        let group_set = match group_field {
            Some(FieldDescriptor {
                name,
                kind: FieldKind::Flags(set),
                ..
            }) => Some((*name, *set)),
            Some(field) => {
                return Err(GeoError::InvalidGroupsField {
                    record: schema.name,
                    field: field.name,
                })
            }
            None => None,
        };

        let mut staged: Vec<StagedAttribute> = Vec::new();
        for field in schema.fields.iter().filter(|f| !f.is_group_field()) {
            let Some((attribute_type, tuple_size)) = field.kind.layout() else {
                log::debug!(
                    "Skipping field '{}' of '{}': no attribute mapping for {:?}",
                    field.name,
                    schema.name,
                    field.kind
                );
                continue;
            };

            let owner = match field.scope {
                FieldScope::Instance => AttributeOwner::Point,
                FieldScope::Static => AttributeOwner::Detail,
            };
            if staged.iter().any(|s| s.name == field.name && s.owner == owner) {
                log::debug!(
                    "Skipping duplicate field '{}' of '{}'",
                    field.name,
                    schema.name
                );
                continue;
            }
            self.check_attribute_layout(field.name, owner, attribute_type, tuple_size)?;

            // Encoding goes through a scratch attribute so the layout checks
            // match those of the real one.
            let scratch = Attribute::new(field.name, owner, attribute_type, tuple_size);
            let mut values = AttributeData::new(attribute_type);
            let sources: &[&dyn PointRecord] = match field.scope {
                FieldScope::Instance => records,
                FieldScope::Static => &records[..1],
            };
            for record in sources {
                let value = record.field(field.name).ok_or(GeoError::MissingFieldValue {
                    record: schema.name,
                    field: field.name,
                })?;
                values.append(scratch.encode(&value, translate)?);
            }

            staged.push(StagedAttribute {
                name: field.name,
                owner,
                attribute_type,
                tuple_size,
                values,
            });
        }

        let groups = match group_set {
            Some((field, set)) => stage_groups(records, schema.name, field, set)?,
            None => Vec::new(),
        };

        // Commit. Attributes are created before the count grows so their
        // backfill covers only the points that existed before this batch.
        let start = self.point_count();
        let count = records.len();

        for s in &staged {
            self.get_or_create_attribute(s.name, s.attribute_type, s.tuple_size, s.owner)?;
        }

        self.grow_point_count(count);

        for s in staged {
            let attribute =
                self.get_or_create_attribute(s.name, s.attribute_type, s.tuple_size, s.owner)?;
            match s.owner {
                AttributeOwner::Detail => attribute.overwrite_encoded(0, s.values),
                _ => attribute.append_encoded(s.values),
            }
        }
        self.pad_point_attributes();

        for group in groups {
            self.add_group(
                group.name,
                GroupType::Points,
                group.members.into_iter().map(|i| start + i),
            )?;
        }

        log::debug!(
            "Added {} '{}' points ({} attributes now, {} points total)",
            count,
            schema.name,
            self.attributes().len(),
            self.point_count()
        );

        Ok(start..self.point_count())
    }

    /// Append splines as cubic NURBS curves.
    ///
    /// Each spline adds its points, then one vertex per point in reverse
    /// point order, then a curve primitive over the new vertices in forward
    /// order with a clamped uniform knot vector. Returns the index range of
    /// the new primitives. Nothing is added if any spline fails.
    pub fn add_splines<S: SplineRecord>(
        &mut self,
        splines: &[S],
        translate: bool,
    ) -> GeoResult<Range<usize>> {
        for (index, spline) in splines.iter().enumerate() {
            let points = spline.point_records().len();
            if points < 2 {
                return Err(GeoError::DegenerateSpline { index, points });
            }
        }

        let mut working = self.clone();
        let start = working.prim_count();

        for spline in splines {
            let points = working.add_point_records(&spline.point_records(), translate)?;

            let first_vertex = working.vertex_count();
            for point in points.clone().rev() {
                working.add_vertex(point)?;
            }
            let vertices: Vec<usize> = (first_vertex..working.vertex_count()).collect();

            let curve = NurbCurvePrimitive::cubic(vertices, spline.is_closed());
            working.add_primitive(Primitive::NurbCurve(curve))?;
        }

        let end = working.prim_count();
        log::debug!("Added {} splines as curves", end - start);

        *self = working;
        Ok(start..end)
    }
}

/// Point membership for every group flag, as offsets into the batch.
fn stage_groups(
    records: &[&dyn PointRecord],
    record: &'static str,
    field: &'static str,
    set: &'static FlagSet,
) -> GeoResult<Vec<StagedGroup>> {
    let mut bits = Vec::with_capacity(records.len());
    for r in records {
        match r.field(field) {
            Some(FieldValue::Flags(b)) => bits.push(b),
            Some(other) => {
                return Err(GeoError::ValueMismatch {
                    attribute: field.to_string(),
                    expected: format!("flags of {}", set.name),
                    found: other.kind_name(),
                })
            }
            None => return Err(GeoError::MissingFieldValue { record, field }),
        }
    }

    Ok(set
        .group_flags()
        .map(|(name, value)| StagedGroup {
            name,
            members: bits
                .iter()
                .enumerate()
                .filter(|&(_, &b)| b & value == value)
                .map(|(i, _)| i)
                .collect(),
        })
        .collect())
}
