//! Items and typed attribute values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::{KeyAttribute, KeyType, TableDescriptor};
use crate::errors::{Result, StoreError};

/// Named attributes of an item. Names are unique by construction.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A typed attribute value.
///
/// Serialises in the DynamoDB JSON shape, e.g. `{"S": "red"}` or
/// `{"N": "42"}`. Binary values are base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrValue {
    S(String),
    /// Numbers keep their decimal string form so no precision is lost.
    N(String),
    B(#[serde(with = "base64_bytes")] Vec<u8>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null,
    L(Vec<AttrValue>),
    M(BTreeMap<String, AttrValue>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(#[serde(with = "base64_byte_sets")] Vec<Vec<u8>>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&str> {
        match self {
            AttrValue::N(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::S(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::S(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::N(value.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::N(value.to_string())
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(value: Vec<u8>) -> Self {
        AttrValue::B(value)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod base64_byte_sets {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sets: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(sets.len()))?;
        for bytes in sets {
            seq.serialize_element(&STANDARD.encode(bytes))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// A keyed record.
///
/// The range key is optional; an empty range key means "no range key".
/// Key attributes live in `primary_key`/`range_key`, never in `attrs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    primary_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range_key: Option<String>,
    #[serde(default)]
    attrs: Attributes,
}

impl Item {
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            range_key: None,
            attrs: Attributes::new(),
        }
    }

    /// Build an item without a range key from `(name, value)` pairs.
    pub fn with_attrs<I, K, V>(primary_key: impl Into<String>, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut item = Item::new(primary_key);
        for (name, value) in attrs {
            item.attrs.insert(name.into(), value.into());
        }
        item
    }

    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        let range_key = range_key.into();
        self.range_key = (!range_key.is_empty()).then_some(range_key);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace an attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.attrs.insert(name.into(), value.into())
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn range_key(&self) -> Option<&str> {
        self.range_key.as_deref()
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn into_attrs(self) -> Attributes {
        self.attrs
    }

    /// Rebuild an item from a full attribute map as returned by the datastore,
    /// lifting the key attributes out of the map.
    pub(crate) fn from_stored(
        descriptor: &TableDescriptor,
        primary_key: &str,
        range_key: Option<&str>,
        mut attrs: Attributes,
    ) -> Self {
        attrs.remove(&descriptor.partition_key().name);
        if let Some(sort_key) = descriptor.sort_key() {
            attrs.remove(&sort_key.name);
        }
        Self {
            primary_key: primary_key.to_string(),
            range_key: range_key.map(str::to_string),
            attrs,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range_key {
            Some(range_key) => write!(f, "{}/{}", self.primary_key, range_key)?,
            None => f.write_str(&self.primary_key)?,
        }
        write!(f, " {:?}", self.attrs)
    }
}

/// One key attribute with its typed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPart {
    pub name: String,
    pub value: AttrValue,
}

impl KeyPart {
    fn typed(attribute: &KeyAttribute, raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(StoreError::InvalidItem(format!(
                "key attribute '{}' must not be empty",
                attribute.name
            )));
        }
        let value = match attribute.key_type {
            KeyType::String => AttrValue::S(raw.to_string()),
            KeyType::Number => {
                // The float parser also accepts NaN and infinities.
                if !raw.parse::<f64>().is_ok_and(f64::is_finite) {
                    return Err(StoreError::InvalidItem(format!(
                        "key attribute '{}' is numeric but got '{}'",
                        attribute.name, raw
                    )));
                }
                AttrValue::N(raw.to_string())
            }
            KeyType::Binary => AttrValue::B(raw.as_bytes().to_vec()),
        };
        Ok(Self {
            name: attribute.name.clone(),
            value,
        })
    }
}

/// Full primary key of one item, typed per the table's key schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub partition: KeyPart,
    pub sort: Option<KeyPart>,
}

impl ItemKey {
    /// Build the key for `primary_key`/`range_key` against the schema.
    ///
    /// A schema with a sort key requires a range key; a hash-only schema
    /// rejects one.
    pub fn for_schema(
        descriptor: &TableDescriptor,
        primary_key: &str,
        range_key: Option<&str>,
    ) -> Result<Self> {
        let partition = KeyPart::typed(descriptor.partition_key(), primary_key)?;
        let sort = match (descriptor.sort_key(), range_key) {
            (Some(attribute), Some(raw)) => Some(KeyPart::typed(attribute, raw)?),
            (Some(attribute), None) => {
                return Err(StoreError::InvalidItem(format!(
                    "table '{}' requires range key '{}'",
                    descriptor.name(),
                    attribute.name
                )));
            }
            (None, Some(raw)) => {
                return Err(StoreError::InvalidItem(format!(
                    "table '{}' has no range key but '{}' was given",
                    descriptor.name(),
                    raw
                )));
            }
            (None, None) => None,
        };
        Ok(Self { partition, sort })
    }

    pub fn for_item(descriptor: &TableDescriptor, item: &Item) -> Result<Self> {
        for name in item.attrs().keys() {
            let clashes_with_sort = descriptor.sort_key().is_some_and(|k| &k.name == name);
            if name == &descriptor.partition_key().name || clashes_with_sort {
                return Err(StoreError::InvalidItem(format!(
                    "attribute '{}' is a key attribute and cannot be set directly",
                    name
                )));
            }
        }
        Self::for_schema(descriptor, item.primary_key(), item.range_key())
    }

    /// The key as an attribute map, as sent to the datastore.
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(self.partition.name.clone(), self.partition.value.clone());
        if let Some(sort) = &self.sort {
            attrs.insert(sort.name.clone(), sort.value.clone());
        }
        attrs
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.partition.name, self.partition.value)?;
        if let Some(sort) = &self.sort {
            write!(f, ", {}={:?}", sort.name, sort.value)?;
        }
        Ok(())
    }
}
