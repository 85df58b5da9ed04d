use console::style;
use crate::cli::commands::AuditArgs;
use crate::db::Database;
use crate::errors::HexstrikeError;
use crate::models::{AuditEntry, AuditFilter};

pub fn handle_audit(db: &Database, args: AuditArgs) -> Result<(), HexstrikeError> {
    let entries = db.get_audit_log(&AuditFilter {
        action: args.action,
        resource_type: args.resource_type,
        limit: args.limit,
    })?;

    if entries.is_empty() {
        println!("{}", style("No audit entries").dim());
        return Ok(());
    }
    for entry in &entries {
        println!("{}", render_entry(entry));
    }
    Ok(())
}

fn render_entry(entry: &AuditEntry) -> String {
    let resource = match (&entry.resource_type, entry.resource_id) {
        (Some(ty), Some(id)) => format!("{}#{}", ty, id),
        (Some(ty), None) => ty.clone(),
        _ => String::new(),
    };
    let mut line = format!(
        "{}  {:<18} {}",
        style(&entry.created_at).dim(),
        style(&entry.action).cyan(),
        resource
    );
    if let Some(details) = &entry.details {
        line.push_str(&format!("  {}", style(details).dim()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditRecord;

    #[test]
    fn test_render_entry_with_resource() {
        console::set_colors_enabled(false);
        let db = Database::in_memory().unwrap();
        db.log_action(&AuditRecord {
            details: Some("nightly".into()),
            ..AuditRecord::action("backup").on("database", 1)
        })
        .unwrap();
        let entry = &db.get_audit_log(&AuditFilter::default()).unwrap()[0];
        let line = render_entry(entry);
        assert!(line.contains("backup"));
        assert!(line.contains("database#1"));
        assert!(line.contains("nightly"));
    }

    #[test]
    fn test_handle_audit_empty() {
        let db = Database::in_memory().unwrap();
        handle_audit(&db, AuditArgs { action: None, resource_type: None, limit: 10 }).unwrap();
    }
}
