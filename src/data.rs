use self::tabular::{MemberRecord, PointRecord, RecordBundle, TagRecord, WayRecord};

pub mod osm;
pub mod tabular;

/// Map data in table form, one collection per output table. Records keep the order
/// in which their elements were shaped.

#[derive(Debug, Default, Clone)]
pub struct TabularMapData {
    pub points: Vec<PointRecord>,
    pub point_tags: Vec<TagRecord>,
    pub ways: Vec<WayRecord>,
    pub way_tags: Vec<TagRecord>,
    pub way_members: Vec<MemberRecord>,
}

impl TabularMapData {
    pub fn push(&mut self, bundle: RecordBundle) {
        match bundle {
            RecordBundle::Point { point, tags } => {
                self.points.push(point);
                self.point_tags.extend(tags);
            },
            RecordBundle::Way { way, tags, members } => {
                self.ways.push(way);
                self.way_tags.extend(tags);
                self.way_members.extend(members);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: &str, key: &str) -> TagRecord {
        TagRecord {
            id: id.to_string(),
            key: key.to_string(),
            value: "yes".to_string(),
            tag_type: "regular".to_string(),
        }
    }

    #[test]
    fn push_routes_records_to_their_tables() {
        let mut data = TabularMapData::default();
        data.push(RecordBundle::Way {
            way: WayRecord {
                id: "7".to_string(),
                user: "u".to_string(),
                uid: "1".to_string(),
                version: "1".to_string(),
                changeset: "2".to_string(),
                timestamp: "t".to_string(),
            },
            tags: vec![tag("7", "building"), tag("7", "area")],
            members: vec![MemberRecord { id: "7".to_string(), node_id: "10".to_string(), position: 0 }],
        });

        assert_eq!(data.ways.len(), 1);
        assert_eq!(data.way_tags.iter().map(|t| t.key.as_str()).collect::<Vec<_>>(), vec!["building", "area"]);
        assert_eq!(data.way_members.len(), 1);
        assert!(data.points.is_empty());
        assert!(data.point_tags.is_empty());
    }
}
