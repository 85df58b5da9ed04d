pub mod audit;
pub mod codec;
pub mod configs;
pub mod connection;
pub mod defaults;
pub mod maintenance;
pub mod projects;
pub mod scans;
pub mod schema;
pub mod settings;
pub mod shared;
pub mod users;
pub mod vulnerabilities;

pub use connection::{default_db_path, Database, DEFAULT_DB_FILE};
pub use defaults::DEFAULT_SETTINGS;
pub use schema::{InitOutcome, CURRENT_SCHEMA_VERSION};
pub use settings::SettingsSnapshot;
pub use shared::shared_database;
