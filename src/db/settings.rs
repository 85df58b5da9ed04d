use std::collections::BTreeMap;
use rusqlite::OptionalExtension;
use tracing::warn;
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{Decoded, Setting, SettingEntry, SettingValue, ValueType};
use super::codec;
use super::connection::now;
use super::Database;

/// Grouped snapshot: category -> key -> entry.
pub type SettingsSnapshot = BTreeMap<String, BTreeMap<String, SettingEntry>>;

const SETTING_COLUMNS: &str =
    "category, key, value, value_type, description, created_at, updated_at";

impl Database {
    /// Typed value of `category.key`, or `default` untouched when the setting
    /// does not exist. A stored value that fails to parse as its declared type
    /// is returned as its raw string.
    pub fn get_setting(
        &self,
        category: &str,
        key: &str,
        default: Option<SettingValue>,
    ) -> Result<Option<SettingValue>, HexstrikeError> {
        match self.lookup_setting(category, key)? {
            Some(setting) => Ok(setting.value.map(Decoded::into_value)),
            None => Ok(default),
        }
    }

    /// Full row for `category.key`, keeping the decode outcome visible.
    pub fn lookup_setting(
        &self,
        category: &str,
        key: &str,
    ) -> Result<Option<Setting>, HexstrikeError> {
        self.with_tx(|tx| {
            let sql = format!(
                "SELECT {} FROM settings WHERE category = ?1 AND key = ?2",
                SETTING_COLUMNS
            );
            tx.query_row(&sql, rusqlite::params![category, key], read_setting_row)
                .optional()
                .map_err(sql_err("Failed to read setting"))
        })
    }

    /// Insert or update `category.key`. The description is only replaced when
    /// a non-empty one is supplied.
    pub fn set_setting(
        &self,
        category: &str,
        key: &str,
        value: impl Into<SettingValue>,
        value_type: ValueType,
        description: Option<&str>,
    ) -> Result<(), HexstrikeError> {
        let value = value.into();
        self.store_setting(category, key, Some(&value), value_type, description)
    }

    /// Keep `category.key` but store no value. Reads return `None`, never a
    /// caller's default.
    pub fn clear_setting(
        &self,
        category: &str,
        key: &str,
        value_type: ValueType,
        description: Option<&str>,
    ) -> Result<(), HexstrikeError> {
        self.store_setting(category, key, None, value_type, description)
    }

    fn store_setting(
        &self,
        category: &str,
        key: &str,
        value: Option<&SettingValue>,
        value_type: ValueType,
        description: Option<&str>,
    ) -> Result<(), HexstrikeError> {
        if category.trim().is_empty() || key.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput(
                "Setting category and key are required".into(),
            ));
        }
        let encoded = codec::encode(value, value_type);

        self.with_tx(|tx| {
            let ts = now();
            tx.execute(
                "INSERT INTO settings
                    (category, key, value, value_type, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, NULLIF(?5, ''), ?6, ?6)
                 ON CONFLICT(category, key) DO UPDATE SET
                    value = excluded.value,
                    value_type = excluded.value_type,
                    description = COALESCE(NULLIF(?5, ''), settings.description),
                    updated_at = ?6",
                rusqlite::params![category, key, encoded, value_type.as_str(), description, ts],
            )
            .map_err(sql_err("Failed to store setting"))?;
            Ok(())
        })
    }

    /// Every setting, optionally restricted to one category, grouped by
    /// category then key.
    pub fn get_all_settings(
        &self,
        category: Option<&str>,
    ) -> Result<SettingsSnapshot, HexstrikeError> {
        let rows = self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM settings WHERE (?1 IS NULL OR category = ?1)
                     ORDER BY category, key",
                    SETTING_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(rusqlite::params![category], read_setting_row)
                .map_err(sql_err("Query error"))?;

            let mut settings = Vec::new();
            for row in rows {
                settings.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(settings)
        })?;

        let mut snapshot = SettingsSnapshot::new();
        for s in rows {
            let entry = SettingEntry {
                value: s.value,
                value_type: s.value_type,
                description: s.description,
            };
            snapshot.entry(s.category).or_default().insert(s.key, entry);
        }
        Ok(snapshot)
    }
}

fn read_setting_row(row: &rusqlite::Row) -> rusqlite::Result<Setting> {
    let category: String = row.get(0)?;
    let key: String = row.get(1)?;
    let raw: Option<String> = row.get(2)?;
    let tag: Option<String> = row.get(3)?;

    let value_type = match tag.as_deref() {
        None => ValueType::String,
        Some(t) => ValueType::from_tag(t).unwrap_or_else(|| {
            warn!(
                category = %category,
                key = %key,
                value_type = %t,
                "Unknown setting type, reading as string"
            );
            ValueType::String
        }),
    };

    let value = codec::decode(raw.as_deref(), value_type);
    if value.as_ref().is_some_and(Decoded::used_fallback) {
        warn!(
            category = %category,
            key = %key,
            value_type = %value_type,
            "Stored setting does not match its declared type, returning raw text"
        );
    }

    Ok(Setting {
        category,
        key,
        value,
        value_type,
        description: row.get(4)?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_db_set_and_get_integer_setting() {
        let db = Database::in_memory().unwrap();
        db.set_setting("server", "port", 9999, ValueType::Integer, None).unwrap();

        let value = db.get_setting("server", "port", None).unwrap();
        assert_eq!(value, Some(SettingValue::Integer(9999)));
    }

    #[test]
    fn test_db_missing_setting_returns_default_unmodified() {
        let db = Database::in_memory().unwrap();
        let value = db.get_setting("missing", "key", Some("fallback".into())).unwrap();
        assert_eq!(value, Some(SettingValue::String("fallback".into())));

        let none = db.get_setting("missing", "key", None).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_db_default_settings_seeded() {
        let db = Database::in_memory().unwrap();
        let get = |category: &str, key: &str| db.get_setting(category, key, None).unwrap();
        assert_eq!(get("server", "port"), Some(SettingValue::Integer(8889)));
        assert_eq!(get("server", "debug"), Some(SettingValue::Boolean(false)));
        assert_eq!(get("agent", "temperature"), Some(SettingValue::Float(0.7)));
        assert_eq!(get("frontend", "theme"), Some(SettingValue::from("dark")));
    }

    #[test]
    fn test_db_set_setting_upsert_preserves_description() {
        let db = Database::in_memory().unwrap();
        db.set_setting("scan", "max_concurrent", 10, ValueType::Integer, None).unwrap();

        let s = db.lookup_setting("scan", "max_concurrent").unwrap().unwrap();
        assert_eq!(s.value, Some(Decoded::Value(SettingValue::Integer(10))));
        assert_eq!(s.description.as_deref(), Some("Maximum concurrent scans"));

        db.set_setting("scan", "max_concurrent", 12, ValueType::Integer, Some("")).unwrap();
        let s = db.lookup_setting("scan", "max_concurrent").unwrap().unwrap();
        assert_eq!(s.description.as_deref(), Some("Maximum concurrent scans"));

        db.set_setting("scan", "max_concurrent", 12, ValueType::Integer, Some("Parallel scan cap"))
            .unwrap();
        let s = db.lookup_setting("scan", "max_concurrent").unwrap().unwrap();
        assert_eq!(s.description.as_deref(), Some("Parallel scan cap"));
    }

    #[test]
    fn test_db_set_setting_changes_type() {
        let db = Database::in_memory().unwrap();
        let theme = json!({"mode": "dark", "accent": "red"});
        db.set_setting("frontend", "theme", theme, ValueType::Json, None).unwrap();
        let value = db.get_setting("frontend", "theme", None).unwrap();
        assert_eq!(value, Some(SettingValue::Json(json!({"accent": "red", "mode": "dark"}))));
    }

    #[test]
    fn test_db_corrupt_value_falls_back_to_raw() {
        let db = Database::in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute(
                "UPDATE settings SET value = 'eighty' WHERE category = 'server' AND key = 'port'",
                [],
            )
            .unwrap();

        let s = db.lookup_setting("server", "port").unwrap().unwrap();
        assert_eq!(s.value, Some(Decoded::Fallback("eighty".into())));
        assert_eq!(
            db.get_setting("server", "port", None).unwrap(),
            Some(SettingValue::from("eighty"))
        );
    }

    #[test]
    fn test_db_unknown_type_tag_reads_as_string() {
        let db = Database::in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO settings (category, key, value, value_type)
                 VALUES ('x', 'y', '<a/>', 'xml')",
                [],
            )
            .unwrap();
        let s = db.lookup_setting("x", "y").unwrap().unwrap();
        assert_eq!(s.value_type, ValueType::String);
        assert_eq!(s.value, Some(Decoded::Value(SettingValue::from("<a/>"))));
    }

    #[test]
    fn test_db_null_value_stays_absent() {
        let db = Database::in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO settings (category, key, value, value_type)
                 VALUES ('x', 'empty', NULL, 'integer')",
                [],
            )
            .unwrap();
        // The row exists, so the default is not substituted.
        assert_eq!(db.get_setting("x", "empty", Some(5.into())).unwrap(), None);
    }

    #[test]
    fn test_db_get_all_settings_grouped() {
        let db = Database::in_memory().unwrap();
        let all = db.get_all_settings(None).unwrap();
        assert_eq!(
            all.keys().cloned().collect::<Vec<_>>(),
            vec!["agent", "frontend", "scan", "security", "server"]
        );
        assert_eq!(all["server"].len(), 4);
        assert_eq!(all["server"]["port"].value_type, ValueType::Integer);
        assert_eq!(all["server"]["port"].description.as_deref(), Some("Server port"));
    }

    #[test]
    fn test_db_get_all_settings_filtered() {
        let db = Database::in_memory().unwrap();
        let security = db.get_all_settings(Some("security")).unwrap();
        assert_eq!(security.len(), 1);
        assert_eq!(security["security"].len(), 3);

        let none = db.get_all_settings(Some("nonexistent")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_db_clear_setting_reads_back_absent() {
        let db = Database::in_memory().unwrap();
        db.clear_setting("server", "port", ValueType::Integer, None).unwrap();

        assert_eq!(db.get_setting("server", "port", Some(SettingValue::Integer(1))).unwrap(), None);
        let setting = db.lookup_setting("server", "port").unwrap().unwrap();
        assert!(setting.value.is_none());
        assert_eq!(setting.value_type, ValueType::Integer);
        assert!(setting.description.is_some());

        let snapshot = db.get_all_settings(Some("server")).unwrap();
        assert!(snapshot["server"]["port"].value.is_none());
    }

    #[test]
    fn test_db_set_setting_requires_key() {
        let db = Database::in_memory().unwrap();
        let err = db.set_setting("server", "", "x", ValueType::String, None).unwrap_err();
        assert!(matches!(err, HexstrikeError::InvalidInput(_)));
    }
}
