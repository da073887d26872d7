//! Immutable description of the managed table: name, key schema and
//! provisioning.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl KeyType {
    /// The DynamoDB scalar type letter.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "S",
            KeyType::Number => "N",
            KeyType::Binary => "B",
        }
    }
}

/// Name and type of a key attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyAttribute {
    pub name: String,
    #[serde(rename = "type", default = "default_key_type")]
    pub key_type: KeyType,
}

fn default_key_type() -> KeyType {
    KeyType::String
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::String)
    }
}

/// Capacity mode of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Provisioning {
    Provisioned {
        read_capacity_units: i64,
        write_capacity_units: i64,
    },
    OnDemand,
}

impl Default for Provisioning {
    fn default() -> Self {
        Provisioning::Provisioned {
            read_capacity_units: 1,
            write_capacity_units: 1,
        }
    }
}

/// Everything needed to create the table. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    name: String,
    partition_key: KeyAttribute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_key: Option<KeyAttribute>,
    #[serde(default)]
    provisioning: Provisioning,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, partition_key: KeyAttribute) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key: None,
            provisioning: Provisioning::default(),
        }
    }

    /// Same schema under another table name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sort_key(mut self, sort_key: KeyAttribute) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn with_provisioning(mut self, provisioning: Provisioning) -> Self {
        self.provisioning = provisioning;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition_key(&self) -> &KeyAttribute {
        &self.partition_key
    }

    pub fn sort_key(&self) -> Option<&KeyAttribute> {
        self.sort_key.as_ref()
    }

    pub fn provisioning(&self) -> Provisioning {
        self.provisioning
    }

    /// Check the descriptor can be sent to the service as is.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Config(
                "table name must not be empty".to_string(),
            ));
        }
        if self.partition_key.name.trim().is_empty() {
            return Err(StoreError::Config(
                "partition key name must not be empty".to_string(),
            ));
        }
        if let Some(sort_key) = &self.sort_key {
            if sort_key.name.trim().is_empty() {
                return Err(StoreError::Config(
                    "sort key name must not be empty".to_string(),
                ));
            }
            if sort_key.name == self.partition_key.name {
                return Err(StoreError::Config(format!(
                    "sort key '{}' must differ from the partition key",
                    sort_key.name
                )));
            }
        }
        if let Provisioning::Provisioned {
            read_capacity_units,
            write_capacity_units,
        } = self.provisioning
            && (read_capacity_units < 1 || write_capacity_units < 1)
        {
            return Err(StoreError::Config(
                "provisioned capacity units must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TableDescriptor {
    fn default() -> Self {
        TableDescriptor::new("DemoTable", KeyAttribute::string("aggregateId"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_table() {
        let desc = TableDescriptor::default();
        assert_eq!(desc.name(), "DemoTable");
        assert_eq!(desc.partition_key().name, "aggregateId");
        assert_eq!(desc.partition_key().key_type, KeyType::String);
        assert!(desc.sort_key().is_none());
        assert_eq!(
            desc.provisioning(),
            Provisioning::Provisioned {
                read_capacity_units: 1,
                write_capacity_units: 1
            }
        );
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn rejects_bad_schemas() {
        let empty = TableDescriptor::new("", KeyAttribute::string("id"));
        assert!(matches!(empty.validate(), Err(StoreError::Config(_))));

        let same = TableDescriptor::new("Orders", KeyAttribute::string("id"))
            .with_sort_key(KeyAttribute::string("id"));
        assert!(same.validate().is_err());

        let zero = TableDescriptor::new("Orders", KeyAttribute::string("id")).with_provisioning(
            Provisioning::Provisioned {
                read_capacity_units: 0,
                write_capacity_units: 1,
            },
        );
        assert!(zero.validate().is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let desc: TableDescriptor = serde_json::from_str(
            r#"{
                "name": "Orders",
                "partition_key": {"name": "id", "type": "S"},
                "sort_key": {"name": "created", "type": "N"},
                "provisioning": {"mode": "on_demand"}
            }"#,
        )
        .unwrap();
        assert_eq!(desc.name(), "Orders");
        assert_eq!(desc.sort_key().unwrap().key_type, KeyType::Number);
        assert_eq!(desc.provisioning(), Provisioning::OnDemand);
    }
}
