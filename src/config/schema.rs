use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "database": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "minLength": 1 }
                }
            },
            "logging": {
                "type": "object",
                "properties": {
                    "level": { "type": "string" },
                    "format": { "type": "string", "enum": ["text", "json"] }
                }
            },
            "backup": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "minLength": 1 }
                }
            }
        }
    })
});
