//! Type conversions between dynostore values and DynamoDB `AttributeValue`.

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use crate::errors::{DatastoreError, DatastoreErrorKind};
use crate::item::{AttrValue, Attributes};

/// Convert an [`AttrValue`] to the SDK representation.
pub fn to_attribute_value(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::S(s) => AttributeValue::S(s.clone()),
        AttrValue::N(n) => AttributeValue::N(n.clone()),
        AttrValue::B(b) => AttributeValue::B(Blob::new(b.clone())),
        AttrValue::Bool(b) => AttributeValue::Bool(*b),
        AttrValue::Null => AttributeValue::Null(true),
        AttrValue::L(list) => AttributeValue::L(list.iter().map(to_attribute_value).collect()),
        AttrValue::M(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ),
        AttrValue::Ss(ss) => AttributeValue::Ss(ss.clone()),
        AttrValue::Ns(ns) => AttributeValue::Ns(ns.clone()),
        AttrValue::Bs(bs) => AttributeValue::Bs(bs.iter().cloned().map(Blob::new).collect()),
    }
}

/// Convert an SDK `AttributeValue` back to an [`AttrValue`].
///
/// Fails on variants this crate does not model (the SDK enum is
/// non-exhaustive).
pub fn from_attribute_value(value: AttributeValue) -> Result<AttrValue, DatastoreError> {
    match value {
        AttributeValue::S(s) => Ok(AttrValue::S(s)),
        AttributeValue::N(n) => Ok(AttrValue::N(n)),
        AttributeValue::B(b) => Ok(AttrValue::B(b.into_inner())),
        AttributeValue::Bool(b) => Ok(AttrValue::Bool(b)),
        AttributeValue::Null(_) => Ok(AttrValue::Null),
        AttributeValue::L(list) => Ok(AttrValue::L(
            list.into_iter()
                .map(from_attribute_value)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        AttributeValue::M(map) => Ok(AttrValue::M(
            map.into_iter()
                .map(|(k, v)| Ok((k, from_attribute_value(v)?)))
                .collect::<Result<_, DatastoreError>>()?,
        )),
        AttributeValue::Ss(ss) => Ok(AttrValue::Ss(ss)),
        AttributeValue::Ns(ns) => Ok(AttrValue::Ns(ns)),
        AttributeValue::Bs(bs) => Ok(AttrValue::Bs(
            bs.into_iter().map(Blob::into_inner).collect(),
        )),
        other => Err(DatastoreError::new(
            DatastoreErrorKind::Validation,
            format!("Unknown DynamoDB AttributeValue type: {:?}", other),
        )),
    }
}

/// Convert an attribute map to the SDK item representation.
pub fn to_item(attrs: &Attributes) -> HashMap<String, AttributeValue> {
    attrs
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

/// Convert an SDK item back to an attribute map.
pub fn from_item(item: HashMap<String, AttributeValue>) -> Result<Attributes, DatastoreError> {
    let mut result = Attributes::new();
    for (key, value) in item {
        result.insert(key, from_attribute_value(value)?);
    }
    Ok(result)
}
