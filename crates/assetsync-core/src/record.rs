//! Minimal record container: a named, typed bag of fields, one of which may
//! reference an asset through its metadata snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::asset::AssetMetadata;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    String(String),
    Int64(i64),
    Asset(AssetMetadata),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    record_type: String,
    record_name: String,
    #[serde(default)]
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(record_type: impl Into<String>, record_name: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            record_name: record_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldValue> {
        self.fields.get(field_name)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, field_name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field_name.into(), value)
    }

    pub fn remove(&mut self, field_name: &str) -> Option<FieldValue> {
        self.fields.remove(field_name)
    }

    /// Asset metadata stored in `field_name`, if that field holds an asset.
    pub fn asset(&self, field_name: &str) -> Option<&AssetMetadata> {
        match self.fields.get(field_name) {
            Some(FieldValue::Asset(meta)) => Some(meta),
            _ => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
