use serde::Serialize;

// Field order is the column order of the output tables.

pub const POINT_COLUMNS: [&str; 8] = ["id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp"];
pub const WAY_COLUMNS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];
pub const TAG_COLUMNS: [&str; 4] = ["id", "key", "value", "type"];
pub const MEMBER_COLUMNS: [&str; 3] = ["id", "node_id", "position"];

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PointRecord {
    pub id: String,
    pub lat: String,
    pub lon: String,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WayRecord {
    pub id: String,
    pub user: String,
    pub uid: String,
    pub version: String,
    pub changeset: String,
    pub timestamp: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: String,
    pub node_id: String,
    pub position: usize,
}

/// Everything produced by shaping a single source element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBundle {
    Point {
        point: PointRecord,
        tags: Vec<TagRecord>,
    },
    Way {
        way: WayRecord,
        tags: Vec<TagRecord>,
        members: Vec<MemberRecord>,
    },
}
