use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_TAG_TYPE: &str = "regular";

// Keys containing any of these would break column semantics downstream.
static PROBLEM_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).expect("problem character pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagClass<'a> {
    pub tag_type: &'a str,
    pub key: &'a str,
}

/// Splits a raw tag key into `(type, key)`. Only the first colon separates the two,
/// so `addr:street:name` becomes type `addr` and key `street:name`. Keys without a
/// colon get the `regular` type. Returns `None` for keys with problem characters.
pub fn classify(k: &str) -> Option<TagClass<'_>> {
    if PROBLEM_CHARS.is_match(k) {
        return None;
    }
    Some(match k.split_once(':') {
        Some((tag_type, key)) => TagClass { tag_type, key },
        None => TagClass { tag_type: DEFAULT_TAG_TYPE, key: k },
    })
}
