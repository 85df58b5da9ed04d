use crate::models::{DefaultSetting, ValueType};

const fn setting(
    category: &'static str,
    key: &'static str,
    value: &'static str,
    value_type: ValueType,
    description: &'static str,
) -> DefaultSetting {
    DefaultSetting { category, key, value, value_type, description }
}

/// Seeded with insert-or-ignore when the schema is created, so values a user
/// has changed are never overwritten.
pub const DEFAULT_SETTINGS: &[DefaultSetting] = &[
    // Server
    setting("server", "host", "127.0.0.1", ValueType::String, "Server bind address"),
    setting("server", "port", "8889", ValueType::Integer, "Server port"),
    setting("server", "debug", "false", ValueType::Boolean, "Debug mode"),
    setting("server", "auto_port", "true", ValueType::Boolean, "Automatic port fallback"),
    // Frontend
    setting("frontend", "port", "3000", ValueType::Integer, "Frontend development server port"),
    setting("frontend", "theme", "dark", ValueType::String, "UI theme (dark/light)"),
    // Security
    setting(
        "security",
        "session_timeout",
        "3600",
        ValueType::Integer,
        "Session timeout in seconds",
    ),
    setting(
        "security",
        "max_login_attempts",
        "5",
        ValueType::Integer,
        "Maximum login attempts before lockout",
    ),
    setting("security", "require_auth", "false", ValueType::Boolean, "Require authentication"),
    // Scan
    setting(
        "scan",
        "default_timeout",
        "300",
        ValueType::Integer,
        "Default scan timeout in seconds",
    ),
    setting("scan", "max_concurrent", "5", ValueType::Integer, "Maximum concurrent scans"),
    setting("scan", "auto_resume", "true", ValueType::Boolean, "Auto-resume interrupted scans"),
    // Agent
    setting("agent", "default_model", "gpt-4", ValueType::String, "Default AI model for agents"),
    setting(
        "agent",
        "max_tokens",
        "4096",
        ValueType::Integer,
        "Maximum tokens for agent responses",
    ),
    setting("agent", "temperature", "0.7", ValueType::Float, "Agent response temperature"),
];
