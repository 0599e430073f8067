//! Serde model for multi-valued request attributes in expectation
//! definitions (headers, cookies, query string and path parameters).
//!
//! Two JSON/YAML shapes are accepted:
//!
//! ```json
//! [ { "name": "keyOne", "values": ["valueOne", "valueTwo"] } ]
//! ```
//!
//! ```json
//! { "keyMatchStyle": "MATCHING_KEY", "keyOne": ["valueOne", "valueTwo"], "keyTwo": "valueThree" }
//! ```
//!
//! The object form preserves key order.

use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::KeyMatchStyle;
use crate::pattern::{PatternKind, PatternString};

const KEY_MATCH_STYLE_FIELD: &str = "keyMatchStyle";

/// One key with its ordered values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyToMultiValue {
    pub name: PatternString,
    #[serde(default)]
    pub values: Vec<PatternString>,
}

impl KeyToMultiValue {
    pub fn new<K, I, V>(name: K, values: I) -> Self
    where
        K: Into<PatternString>,
        I: IntoIterator<Item = V>,
        V: Into<PatternString>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Values to store for this key; a key without values stands for a
    /// single empty literal value.
    pub fn effective_values(&self) -> Vec<PatternString> {
        if self.values.is_empty() {
            vec![PatternString::literal("")]
        } else {
            self.values.clone()
        }
    }
}

/// An attribute group as written in an expectation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeysToMultiValues {
    pub key_match_style: Option<KeyMatchStyle>,
    pub entries: Vec<KeyToMultiValue>,
}

impl KeysToMultiValues {
    pub fn new(entries: Vec<KeyToMultiValue>) -> Self {
        Self {
            key_match_style: None,
            entries,
        }
    }

    pub fn with_key_match_style(mut self, style: KeyMatchStyle) -> Self {
        self.key_match_style = Some(style);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every name can be written as an object key.
    fn has_textual_names(&self) -> bool {
        self.entries.iter().all(|entry| {
            entry.name.kind() != PatternKind::Schema
                && entry.name.value() != KEY_MATCH_STYLE_FIELD
                && PatternString::parse(&entry.name.to_text()) == entry.name
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<PatternString>),
    One(PatternString),
}

struct KeysToMultiValuesVisitor;

impl<'de> Visitor<'de> for KeysToMultiValuesVisitor {
    type Value = KeysToMultiValues;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of {name, values} objects or an object of key to values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(entry) = seq.next_element::<KeyToMultiValue>()? {
            entries.push(entry);
        }
        Ok(KeysToMultiValues::new(entries))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut group = KeysToMultiValues::default();
        while let Some(key) = map.next_key::<String>()? {
            if key == KEY_MATCH_STYLE_FIELD {
                group.key_match_style = Some(map.next_value()?);
                continue;
            }
            let values = match map.next_value::<OneOrMany>()? {
                OneOrMany::Many(values) => values,
                OneOrMany::One(value) => vec![value],
            };
            group.entries.push(KeyToMultiValue {
                name: PatternString::parse(&key),
                values,
            });
        }
        Ok(group)
    }
}

impl<'de> Deserialize<'de> for KeysToMultiValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeysToMultiValuesVisitor)
    }
}

impl Serialize for KeysToMultiValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.key_match_style.is_none() && !self.has_textual_names() {
            return self.entries.serialize(serializer);
        }
        if !self.has_textual_names() {
            return Err(serde::ser::Error::custom(
                "keyMatchStyle can only be written together with textual key names",
            ));
        }
        let extra = usize::from(self.key_match_style.is_some());
        let mut map = serializer.serialize_map(Some(self.entries.len() + extra))?;
        if let Some(style) = &self.key_match_style {
            map.serialize_entry(KEY_MATCH_STYLE_FIELD, style)?;
        }
        for entry in &self.entries {
            map.serialize_entry(&entry.name.to_text(), &entry.values)?;
        }
        map.end()
    }
}
