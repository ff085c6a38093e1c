//! Records kept in the JSON file store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trackcache::KeyProperty;

/// One row of the data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl KeyProperty<String> for Record {
    fn key_accessor(name: &str) -> Option<fn(&Self) -> String> {
        let accessor: fn(&Self) -> String = match name {
            "id" => |record| record.id.to_string(),
            "name" => |record| record.name.clone(),
            _ => return None,
        };
        Some(accessor)
    }
}
