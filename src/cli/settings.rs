use console::style;
use crate::cli::commands::{GetArgs, SetArgs, SettingsArgs};
use crate::db::Database;
use crate::errors::HexstrikeError;
use crate::models::{AuditRecord, Decoded, SettingValue, ValueType};

pub fn handle_settings(db: &Database, args: SettingsArgs) -> Result<(), HexstrikeError> {
    let snapshot = db.get_all_settings(args.category.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("{}", style("No settings found").dim());
        return Ok(());
    }
    for (category, entries) in &snapshot {
        println!("\n{}", style(format!("[{}]", category)).cyan().bold());
        for (key, entry) in entries {
            println!(
                "  {:<24} {:<28} {}",
                key,
                render_value(entry.value.as_ref()),
                style(entry.value_type).dim()
            );
            if let Some(desc) = entry.description.as_deref().filter(|d| !d.is_empty()) {
                println!("  {:<24} {}", "", style(desc).dim());
            }
        }
    }
    println!();
    Ok(())
}

pub fn handle_get(db: &Database, args: GetArgs) -> Result<(), HexstrikeError> {
    match db.lookup_setting(&args.category, &args.key)? {
        Some(setting) => {
            println!("{}", render_value(setting.value.as_ref()));
            Ok(())
        }
        None => Err(HexstrikeError::InvalidInput(format!(
            "Setting {}.{} does not exist",
            args.category, args.key
        ))),
    }
}

pub fn handle_set(db: &Database, args: SetArgs) -> Result<(), HexstrikeError> {
    let value_type: ValueType = args.value_type.parse().map_err(HexstrikeError::InvalidInput)?;
    let value = parse_cli_value(&args.value, value_type)?;

    db.set_setting(&args.category, &args.key, value, value_type, args.description.as_deref())?;
    db.log_action(&AuditRecord {
        resource_type: Some("setting".into()),
        details: Some(format!("{}.{}", args.category, args.key)),
        ..AuditRecord::action("update_setting")
    })?;

    println!(
        "{} {}.{} = {}",
        style("\u{2714}").green().bold(),
        args.category,
        args.key,
        args.value
    );
    Ok(())
}

/// Interpret command-line text as `value_type`, rejecting text that would not
/// read back as that type.
pub fn parse_cli_value(raw: &str, value_type: ValueType) -> Result<SettingValue, HexstrikeError> {
    let invalid =
        |what: &str| HexstrikeError::InvalidInput(format!("'{}' is not a valid {}", raw, what));
    match value_type {
        ValueType::String => Ok(SettingValue::String(raw.to_string())),
        ValueType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(SettingValue::Integer)
            .map_err(|_| invalid("integer")),
        ValueType::Float => raw
            .trim()
            .parse::<f64>()
            .map(SettingValue::Float)
            .map_err(|_| invalid("float")),
        ValueType::Boolean => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(SettingValue::Boolean(true)),
            "false" | "0" | "no" => Ok(SettingValue::Boolean(false)),
            _ => Err(invalid("boolean")),
        },
        ValueType::Json => serde_json::from_str(raw)
            .map(SettingValue::Json)
            .map_err(|_| invalid("JSON document")),
    }
}

fn render_value(value: Option<&Decoded>) -> String {
    match value {
        Some(Decoded::Value(SettingValue::Json(v))) => v.to_string(),
        Some(Decoded::Value(v)) => v.to_string(),
        Some(Decoded::Fallback(raw)) => format!("{} (unparsed)", raw),
        None => "null".to_string(),
    }
}
