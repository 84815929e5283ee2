use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::Rejection;

// The last word, allowing for a single line break after it.
static TRAILING_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S+)\n?$").expect("trailing token pattern is valid")
});

const SAN_JOSE_STREET_ABBREVIATIONS: [(&str, &str); 12] = [
    ("Ln", "Lane"),
    ("Rd", "Road"),
    ("ave", "Avenue"),
    ("Ave", "Avenue"),
    // Backwards compared to the rest of the table, kept as found in the source data rules.
    ("court", "Ct"),
    ("Blvd", "Boulevard"),
    ("Hwy", "Highway"),
    ("Dr", "Drive"),
    ("street", "Street"),
    ("St", "Street"),
    ("Sq", "Square"),
    ("Blvd.", "Boulevard"),
];

const SAN_JOSE_POSTCODES: [&str; 67] = [
    "94088", "94089", "94538", "94560", "95002", "95008", "95013", "95035", "95037", "95050",
    "95054", "95101", "95103", "95106", "95108", "95109", "95110", "95111", "95112", "95113",
    "95115", "95116", "95117", "95118", "95119", "95120", "95121", "95122", "95123", "95124",
    "95125", "95126", "95127", "95128", "95129", "95130", "95131", "95132", "95133", "95134",
    "95135", "95136", "95138", "95139", "95141", "95148", "95150", "95151", "95152", "95153",
    "95154", "95155", "95156", "95157", "95158", "95160", "95161", "95164", "95170", "95172",
    "95173", "95190", "95191", "95192", "95193", "95194", "95196",
];

const SAN_JOSE_CITY_VARIANTS: [&str; 4] = ["San jose", "San Jose", "San José", "san jose"];

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreetSuffixPolicy {
    /// Every occurrence of the matched suffix anywhere in the name is replaced.
    #[default]
    ReplaceAll,
    /// Only the trailing token is replaced.
    TrailingOnly,
}

/// Lookup tables driving the value normalizers. Defaults to the San Jose rules.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CleaningRules {
    pub street_abbreviations: HashMap<String, String>,
    pub street_suffix_policy: StreetSuffixPolicy,
    pub postcodes: HashSet<String>,
    pub city_variants: HashSet<String>,
    pub canonical_city: String,
}

impl Default for CleaningRules {
    fn default() -> Self {
        CleaningRules::san_jose()
    }
}

impl CleaningRules {
    pub fn san_jose() -> Self {
        CleaningRules {
            street_abbreviations: SAN_JOSE_STREET_ABBREVIATIONS.iter()
                .map(|(abbr, full)| (abbr.to_string(), full.to_string()))
                .collect(),
            street_suffix_policy: StreetSuffixPolicy::default(),
            postcodes: SAN_JOSE_POSTCODES.iter().map(|code| code.to_string()).collect(),
            city_variants: SAN_JOSE_CITY_VARIANTS.iter().map(|city| city.to_string()).collect(),
            canonical_city: "San Jose".to_string(),
        }
    }

    /// Expands an abbreviated street suffix (`Main St` -> `Main Street`). Names whose last
    /// token is not in the table come back unchanged.
    pub fn normalize_street(&self, street: &str) -> String {
        let Some(suffix) = TRAILING_TOKEN.captures(street).and_then(|caps| caps.get(1)) else {
            return street.to_string();
        };
        let Some(full) = self.street_abbreviations.get(suffix.as_str()) else {
            return street.to_string();
        };
        match self.street_suffix_policy {
            StreetSuffixPolicy::ReplaceAll => street.replace(suffix.as_str(), full),
            StreetSuffixPolicy::TrailingOnly => {
                format!("{}{}{}", &street[..suffix.start()], full, &street[suffix.end()..])
            },
        }
    }

    /// Drops any ZIP+4 extension and checks the code against the allow-list.
    pub fn normalize_postcode(&self, postcode: &str) -> Result<String, Rejection> {
        let code = postcode.split('-').next().unwrap_or(postcode);
        if self.postcodes.contains(code) {
            Ok(code.to_string())
        } else {
            Err(Rejection::Postcode(postcode.to_string()))
        }
    }

    pub fn normalize_city(&self, city: &str) -> Result<String, Rejection> {
        if self.city_variants.contains(city) {
            Ok(self.canonical_city.clone())
        } else {
            Err(Rejection::City(city.to_string()))
        }
    }
}

/// Keeps the digits of a phone number and drops a single leading country code `1`.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix('1') {
        Some(rest) => rest.to_string(),
        None => digits,
    }
}
