//! Typed point projection: reading points back as records.

use crate::attribute::AttributeOwner;
use crate::geometry::GeoContainer;
use crate::group::GroupType;
use crate::point::{FieldKind, FieldScope, FieldValue, PointRecord};

impl GeoContainer {
    /// Read every point as a `P` record.
    ///
    /// Instance fields are filled from the point attribute of the same name
    /// and static fields from the detail attribute. Fields without a
    /// matching attribute keep their default. A flag-set `groups` field is
    /// rebuilt from point-group membership. Coordinate translation is its
    /// own inverse, so pass the same flag used when the points were added.
    pub fn points<P: PointRecord + Default>(&self, translate: bool) -> Vec<P> {
        let mut records: Vec<P> = (0..self.point_count()).map(|_| P::default()).collect();
        let Some(first) = records.first() else {
            return records;
        };
        let schema = first.schema();

        for field in schema.fields {
            if field.is_group_field() {
                if let FieldKind::Flags(set) = field.kind {
                    let groups: Vec<_> = set
                        .group_flags()
                        .filter_map(|(name, value)| {
                            self.group(name, GroupType::Points).map(|g| (g, value))
                        })
                        .collect();
                    for (index, record) in records.iter_mut().enumerate() {
                        let bits = groups
                            .iter()
                            .filter(|(g, _)| g.contains(index))
                            .fold(0, |acc, (_, value)| acc | value);
                        record.set_field(field.name, FieldValue::Flags(bits));
                    }
                }
                continue;
            }

            let owner = match field.scope {
                FieldScope::Instance => AttributeOwner::Point,
                FieldScope::Static => AttributeOwner::Detail,
            };
            let Some(attribute) = self.attribute(field.name, owner) else {
                continue;
            };

            for (index, record) in records.iter_mut().enumerate() {
                let source = match owner {
                    AttributeOwner::Detail => 0,
                    _ => index,
                };
                match attribute.value(source, &field.kind, translate) {
                    Some(value) => {
                        record.set_field(field.name, value);
                    }
                    None => {
                        log::debug!(
                            "Attribute '{}' does not fit field of '{}', leaving default",
                            field.name,
                            schema.name
                        );
                        break;
                    }
                }
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeType;
    use crate::point::PointData;
    use hgeo_math::{Color, Vec3};

    crate::point_flags! {
        struct Surface { None = 0, Road = 1, Grass = 2 }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Sample {
        p: Vec3,
        cd: Color,
        weight: f32,
        grouping: Surface,
    }

    crate::point_record!(Sample { p as "P": Vec3, cd as "Cd": Color, weight: f32, grouping: Surface });

    #[test]
    fn test_points_round_trip_through_geometry() {
        let input = vec![
            Sample {
                p: Vec3::new(1.0, 2.0, 3.0),
                cd: Color::rgb(1.0, 0.0, 0.0),
                weight: 0.5,
                grouping: Surface::Road,
            },
            Sample {
                p: Vec3::new(-4.0, 5.0, 6.0),
                cd: Color::rgb(0.0, 1.0, 0.0),
                weight: 2.0,
                grouping: Surface::Road | Surface::Grass,
            },
        ];

        let mut geo = GeoContainer::new();
        geo.add_points(&input, true).unwrap();

        let output: Vec<Sample> = geo.points(true);
        assert_eq!(output, input);
    }

    #[test]
    fn test_missing_attributes_keep_defaults() {
        let mut geo = GeoContainer::new();
        geo.add_points(&[PointData::new(Vec3::X)], false).unwrap();

        let output: Vec<Sample> = geo.points(false);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].p, Vec3::X);
        assert_eq!(output[0].weight, 0.0);
        assert_eq!(output[0].grouping, Surface::None);
    }

    #[test]
    fn test_layout_mismatch_is_skipped() {
        let mut geo = GeoContainer::new();
        geo.add_point_block(1);
        geo.get_or_create_attribute("weight", AttributeType::Integer, 1, AttributeOwner::Point)
            .unwrap();

        let output: Vec<Sample> = geo.points(false);
        assert_eq!(output[0].weight, 0.0);
    }

    #[test]
    fn test_empty_geometry_projects_nothing() {
        let geo = GeoContainer::new();
        assert!(geo.points::<PointData>(true).is_empty());
    }
}
