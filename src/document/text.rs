//! Lenient text fields.
//!
//! YAML resolves unquoted scalars, so `timeout: 60`, `version: 1.0` or a
//! selector `enabled: true` arrive as numbers and booleans. Fields that are
//! text in the graph accept any scalar and keep its written form.
//! Use with `#[serde(deserialize_with = "text::...")]`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};

/// A scalar read as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Text(pub String);

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Text;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Text, E> {
        Ok(Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Text, E> {
        Ok(Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Text, E> {
        Ok(Text(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Text, E> {
        Ok(Text(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Text, E> {
        Ok(Text(v.to_string()))
    }

    // Debug keeps the fraction: 1.0 stays "1.0".
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Text, E> {
        Ok(Text(format!("{v:?}")))
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(TextVisitor)
    }
}

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Text::deserialize(d).map(|t| t.0)
}

pub fn option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Text>::deserialize(d)?.map(|t| t.0))
}

pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(Vec::<Text>::deserialize(d)?.into_iter().map(|t| t.0).collect())
}

/// Keys and values both lenient. A null map reads as empty.
pub fn map<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(Option::<BTreeMap<Text, Text>>::deserialize(d)?
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k.0, v.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(deserialize_with = "string")]
        name: String,
        #[serde(default, deserialize_with = "option")]
        version: Option<String>,
        #[serde(default, deserialize_with = "map")]
        tags: BTreeMap<String, String>,
        #[serde(default, deserialize_with = "list")]
        files: Vec<String>,
    }

    fn decode(yaml: &str) -> Fields {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        serde_yaml::from_value(value).unwrap()
    }

    #[test]
    fn test_scalars_keep_written_form() {
        let p = decode("{name: 60, version: 1.0, tags: {version: 1, on: true, 2: x}, files: [a, 3]}");
        assert_eq!(p.name, "60");
        assert_eq!(p.version.as_deref(), Some("1.0"));
        assert_eq!(p.tags.get("version").map(String::as_str), Some("1"));
        assert_eq!(p.tags.get("on").map(String::as_str), Some("true"));
        assert_eq!(p.tags.get("2").map(String::as_str), Some("x"));
        assert_eq!(p.files, vec!["a".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_absent_and_null_optional() {
        assert_eq!(decode("{name: a}").version, None);
        assert_eq!(decode("{name: a, version: null}").version, None);
        assert!(decode("{name: a, tags: null}").tags.is_empty());
    }

    #[test]
    fn test_containers_rejected() {
        let value: serde_yaml::Value = serde_yaml::from_str("{name: [1, 2]}").unwrap();
        assert!(serde_yaml::from_value::<Fields>(value).is_err());
    }
}
