//! Optional process-wide store handle for callers that have no composition
//! root of their own. Nothing in the store API depends on it.

use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;
use crate::errors::HexstrikeError;
use super::Database;

static SHARED: OnceLock<Database> = OnceLock::new();

/// Open the store at `path` on first use and hand out clones of that handle
/// afterwards. Later calls ignore `path`.
pub fn shared_database(path: impl AsRef<Path>) -> Result<Database, HexstrikeError> {
    if let Some(db) = SHARED.get() {
        return Ok(db.clone());
    }
    let db = Database::open(path)?;
    if SHARED.set(db.clone()).is_err() {
        debug!("Shared database initialized concurrently, using existing handle");
    }
    SHARED
        .get()
        .cloned()
        .ok_or_else(|| HexstrikeError::Connection("Shared database unavailable".into()))
}
