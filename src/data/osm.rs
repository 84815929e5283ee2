use std::collections::HashMap;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Point,
    Way,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementChild {
    /// `<tag k=".." v=".."/>`
    Tag { k: String, v: String },
    /// `<nd ref=".."/>`, ways only.
    MemberRef { node_ref: String },
}

/// A top level map element as it appears in the .osm file, before any cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    pub kind: ElementKind,
    pub attributes: HashMap<String, String>,
    pub children: Vec<ElementChild>,
}

impl SourceElement {
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }

    pub fn required_attribute(&self, name: &str) -> Result<&str> {
        self.attributes.get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::missing_attribute(self.id(), name))
    }
}

#[cfg(test)]
impl SourceElement {
    pub fn new(kind: ElementKind) -> Self {
        SourceElement {
            kind,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_tag(mut self, k: &str, v: &str) -> Self {
        self.children.push(ElementChild::Tag { k: k.to_string(), v: v.to_string() });
        self
    }

    pub fn with_member(mut self, node_ref: &str) -> Self {
        self.children.push(ElementChild::MemberRef { node_ref: node_ref.to_string() });
        self
    }
}
