use serde::{Deserialize, Serialize};

/// Declared type of a stored setting. Persisted as its lowercase tag in the
/// `settings.value_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Json,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }

    /// Parse a stored type tag. Returns `None` for tags this build does not know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(&s.to_lowercase()).ok_or_else(|| {
            format!("unknown value type '{}' (expected string, integer, float, boolean or json)", s)
        })
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl SettingValue {
    /// The type a value of this variant is naturally stored as.
    pub fn natural_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Json(_) => ValueType::Json,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Integer(n) => serde_json::Value::from(*n),
            Self::Float(n) => serde_json::Value::from(*n),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Json(v) => v.clone(),
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for SettingValue {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<f64> for SettingValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<serde_json::Value> for SettingValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

/// Result of decoding stored text against its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded {
    /// The text parsed as the declared type.
    Value(SettingValue),
    /// The text did not parse; the raw stored text is returned instead.
    Fallback(String),
}

impl Decoded {
    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Collapse into a plain value; a fallback becomes a string value.
    pub fn into_value(self) -> SettingValue {
        match self {
            Self::Value(v) => v,
            Self::Fallback(raw) => SettingValue::String(raw),
        }
    }
}

/// One row of the `settings` table, decoded.
#[derive(Debug, Clone, Serialize)]
pub struct Setting {
    pub category: String,
    pub key: String,
    pub value: Option<Decoded>,
    pub value_type: ValueType,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-key entry in the grouped snapshot returned by `get_all_settings`.
#[derive(Debug, Clone, Serialize)]
pub struct SettingEntry {
    pub value: Option<Decoded>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub description: Option<String>,
}

/// A built-in default setting, seeded once at schema creation.
#[derive(Debug, Clone, Copy)]
pub struct DefaultSetting {
    pub category: &'static str,
    pub key: &'static str,
    pub value: &'static str,
    pub value_type: ValueType,
    pub description: &'static str,
}
