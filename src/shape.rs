pub mod normalizers;
pub mod tag_classifier;

use crate::{
    data::{
        osm::{ElementChild, ElementKind, SourceElement},
        tabular::{MemberRecord, PointRecord, RecordBundle, TagRecord, WayRecord},
    },
    errors::Result,
};

use self::normalizers::{normalize_phone, CleaningRules};

/// Why a value normalizer refused a tag value. A rejected value drops the whole
/// owning element, not just the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Postcode(String),
    City(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeOutcome {
    Shaped(RecordBundle),
    Rejected(Rejection),
    /// Neither a point nor a way.
    Ignored,
}

/// Turns one source element into flat records. Missing top level attributes are an
/// error; rejected values and unknown element kinds are outcomes.
pub fn shape_element(element: &SourceElement, rules: &CleaningRules) -> Result<ShapeOutcome> {
    match element.kind {
        ElementKind::Point => shape_point(element, rules),
        ElementKind::Way => shape_way(element, rules),
        ElementKind::Other(_) => Ok(ShapeOutcome::Ignored),
    }
}

fn shape_point(element: &SourceElement, rules: &CleaningRules) -> Result<ShapeOutcome> {
    let point = PointRecord {
        id: element.required_attribute("id")?.to_string(),
        lat: element.required_attribute("lat")?.to_string(),
        lon: element.required_attribute("lon")?.to_string(),
        user: element.required_attribute("user")?.to_string(),
        uid: element.required_attribute("uid")?.to_string(),
        version: element.required_attribute("version")?.to_string(),
        changeset: element.required_attribute("changeset")?.to_string(),
        timestamp: element.required_attribute("timestamp")?.to_string(),
    };

    let mut tags = Vec::new();
    for child in &element.children {
        // Points carry no member references; anything other than a tag is skipped.
        if let ElementChild::Tag { k, v } = child {
            match shape_tag(&point.id, k, v, rules, true) {
                Ok(Some(tag)) => tags.push(tag),
                Ok(None) => (),
                Err(rejection) => return Ok(ShapeOutcome::Rejected(rejection)),
            }
        }
    }

    Ok(ShapeOutcome::Shaped(RecordBundle::Point { point, tags }))
}

fn shape_way(element: &SourceElement, rules: &CleaningRules) -> Result<ShapeOutcome> {
    let way = WayRecord {
        id: element.required_attribute("id")?.to_string(),
        user: element.required_attribute("user")?.to_string(),
        uid: element.required_attribute("uid")?.to_string(),
        version: element.required_attribute("version")?.to_string(),
        changeset: element.required_attribute("changeset")?.to_string(),
        timestamp: element.required_attribute("timestamp")?.to_string(),
    };

    let mut tags = Vec::new();
    let mut members = Vec::new();
    for child in &element.children {
        match child {
            ElementChild::Tag { k, v } => {
                match shape_tag(&way.id, k, v, rules, false) {
                    Ok(Some(tag)) => tags.push(tag),
                    Ok(None) => (),
                    Err(rejection) => return Ok(ShapeOutcome::Rejected(rejection)),
                }
            },
            ElementChild::MemberRef { node_ref } => {
                members.push(MemberRecord {
                    id: way.id.clone(),
                    node_id: node_ref.clone(),
                    position: members.len(),
                });
            },
        }
    }

    Ok(ShapeOutcome::Shaped(RecordBundle::Way { way, tags, members }))
}

/// `Ok(None)` means the key has problem characters and the tag is dropped on its own.
fn shape_tag(
    id: &str,
    k: &str,
    v: &str,
    rules: &CleaningRules,
    clean_city: bool,
) -> std::result::Result<Option<TagRecord>, Rejection> {
    let Some(class) = tag_classifier::classify(k) else {
        return Ok(None);
    };

    let value = match k {
        "addr:street" => rules.normalize_street(v),
        "addr:postcode" => rules.normalize_postcode(v)?,
        "phone" => normalize_phone(v),
        "addr:city" if clean_city => rules.normalize_city(v)?,
        _ => v.to_string(),
    };

    Ok(Some(TagRecord {
        id: id.to_string(),
        key: class.key.to_string(),
        value,
        tag_type: class.tag_type.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn point(id: &str) -> SourceElement {
        SourceElement::new(ElementKind::Point)
            .with_attribute("id", id)
            .with_attribute("lat", "37.3382")
            .with_attribute("lon", "-121.8863")
            .with_attribute("user", "mapper")
            .with_attribute("uid", "42")
            .with_attribute("version", "3")
            .with_attribute("changeset", "1001")
            .with_attribute("timestamp", "2016-01-01T00:00:00Z")
            .with_attribute("visible", "true")
    }

    fn way(id: &str) -> SourceElement {
        SourceElement::new(ElementKind::Way)
            .with_attribute("id", id)
            .with_attribute("user", "mapper")
            .with_attribute("uid", "42")
            .with_attribute("version", "1")
            .with_attribute("changeset", "2002")
            .with_attribute("timestamp", "2016-01-01T00:00:00Z")
    }

    fn shape(element: &SourceElement) -> ShapeOutcome {
        shape_element(element, &CleaningRules::san_jose()).unwrap()
    }

    fn tag_triples(tags: &[TagRecord]) -> Vec<(&str, &str, &str)> {
        tags.iter()
            .map(|t| (t.tag_type.as_str(), t.key.as_str(), t.value.as_str()))
            .collect()
    }

    #[test]
    fn bare_point_copies_exactly_its_attributes() {
        let outcome = shape(&point("1"));
        let ShapeOutcome::Shaped(RecordBundle::Point { point, tags }) = outcome else {
            panic!("expected a point bundle");
        };
        assert_eq!(point, PointRecord {
            id: "1".to_string(),
            lat: "37.3382".to_string(),
            lon: "-121.8863".to_string(),
            user: "mapper".to_string(),
            uid: "42".to_string(),
            version: "3".to_string(),
            changeset: "1001".to_string(),
            timestamp: "2016-01-01T00:00:00Z".to_string(),
        });
        assert!(tags.is_empty());
    }

    #[test]
    fn point_tags_are_classified_and_cleaned() {
        let element = point("5")
            .with_tag("amenity", "cafe")
            .with_tag("addr:street", "Lincoln Ave")
            .with_tag("addr:postcode", "95125-1234")
            .with_tag("addr:city", "San José")
            .with_tag("phone", "+1 408 555 0100")
            .with_tag("addr:street:name", "Lincoln")
            .with_tag("bad key", "dropped")
            .with_tag("name", "Caffè");

        let ShapeOutcome::Shaped(RecordBundle::Point { tags, .. }) = shape(&element) else {
            panic!("expected a point bundle");
        };
        assert!(tags.iter().all(|t| t.id == "5"));
        assert_eq!(tag_triples(&tags), vec![
            ("regular", "amenity", "cafe"),
            ("addr", "street", "Lincoln Avenue"),
            ("addr", "postcode", "95125"),
            ("addr", "city", "San Jose"),
            ("regular", "phone", "4085550100"),
            ("addr", "street:name", "Lincoln"),
            ("regular", "name", "Caffè"),
        ]);
    }

    #[test]
    fn foreign_postcode_drops_the_point() {
        let element = point("9").with_tag("name", "Somewhere").with_tag("addr:postcode", "99999");
        assert_eq!(shape(&element), ShapeOutcome::Rejected(Rejection::Postcode("99999".to_string())));
    }

    #[test]
    fn unknown_city_drops_the_point() {
        let element = point("9").with_tag("addr:city", "Cupertino");
        assert_eq!(shape(&element), ShapeOutcome::Rejected(Rejection::City("Cupertino".to_string())));
    }

    #[test]
    fn problem_key_never_triggers_rejection() {
        // The classifier runs first, so a malformed key is only skipped.
        let element = point("3").with_tag("addr:postcode ", "99999");
        let ShapeOutcome::Shaped(RecordBundle::Point { tags, .. }) = shape(&element) else {
            panic!("expected a point bundle");
        };
        assert!(tags.is_empty());
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let mut element = point("4");
        element.attributes.remove("changeset");
        let err = shape_element(&element, &CleaningRules::san_jose()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingAttribute);
        assert!(err.message.contains("changeset"));
        assert!(err.message.contains('4'));
    }

    #[test]
    fn member_positions_skip_tag_children() {
        let element = way("77")
            .with_member("100")
            .with_tag("highway", "residential")
            .with_member("101")
            .with_tag("a,b", "dropped")
            .with_tag("name", "Park Ave")
            .with_member("102")
            .with_member("100");

        let ShapeOutcome::Shaped(RecordBundle::Way { way, tags, members }) = shape(&element) else {
            panic!("expected a way bundle");
        };
        assert_eq!(way.id, "77");
        assert_eq!(tag_triples(&tags), vec![
            ("regular", "highway", "residential"),
            ("regular", "name", "Park Ave"),
        ]);
        let positions: Vec<(&str, usize)> = members.iter()
            .map(|m| (m.node_id.as_str(), m.position))
            .collect();
        assert_eq!(positions, vec![("100", 0), ("101", 1), ("102", 2), ("100", 3)]);
        assert!(members.iter().all(|m| m.id == "77"));
    }

    #[test]
    fn way_city_is_copied_unchanged() {
        let element = way("8").with_tag("addr:city", "Cupertino");
        let ShapeOutcome::Shaped(RecordBundle::Way { tags, .. }) = shape(&element) else {
            panic!("expected a way bundle");
        };
        assert_eq!(tag_triples(&tags), vec![("addr", "city", "Cupertino")]);
    }

    #[test]
    fn way_postcode_rejection_drops_the_way() {
        let element = way("8").with_member("1").with_tag("addr:postcode", "10001");
        assert_eq!(shape(&element), ShapeOutcome::Rejected(Rejection::Postcode("10001".to_string())));
    }

    #[test]
    fn way_without_lat_lon_is_fine() {
        assert!(matches!(shape(&way("2")), ShapeOutcome::Shaped(RecordBundle::Way { .. })));
    }

    #[test]
    fn other_kinds_are_ignored() {
        let element = SourceElement::new(ElementKind::Other("relation".to_string())).with_tag("type", "route");
        assert_eq!(shape(&element), ShapeOutcome::Ignored);
    }
}
