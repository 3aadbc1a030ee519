//! Shared, keyed record stores opened by logical name.
//!
//! A databank is a directory of records under a common root, for example
//! `<root>/pdb/1abc.ent`. The table caches opened handles so lookup by name
//! is idempotent and every concurrent request shares one read-only handle.

use crate::error::ServiceError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Extensions tried, in order, when fetching a record by identifier.
const RECORD_EXTENSIONS: [&str; 3] = ["", ".ent", ".pdb"];

/// Read-only handle onto one databank directory.
#[derive(Debug)]
pub struct Databank {
    name: String,
    dir: PathBuf,
}

impl Databank {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// On-disk location, handed to the external tool chain as its search
    /// target.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fetch a record by identifier. Identifiers are matched
    /// case-insensitively against lowercase file names.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record file exists for the identifier.
    pub fn fetch(&self, id: &str) -> Result<String, ServiceError> {
        let key = id.to_ascii_lowercase();
        for ext in RECORD_EXTENSIONS {
            let candidate = self.dir.join(format!("{key}{ext}"));
            if candidate.is_file() {
                return std::fs::read_to_string(&candidate).map_err(|e| {
                    ServiceError::tool(format!(
                        "cannot read {}: {e}",
                        candidate.display()
                    ))
                });
            }
        }
        Err(ServiceError::not_found(format!(
            "entry {id} not found in {}",
            self.name
        )))
    }
}

/// Cache of opened databank handles, shared across endpoints and requests.
pub struct DatabankTable {
    root: PathBuf,
    open: RwLock<HashMap<String, Arc<Databank>>>,
}

impl DatabankTable {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a databank by logical name, reusing the handle if it was opened
    /// before. The returned handle is shared read-only.
    ///
    /// # Errors
    ///
    /// `NotFound` when no directory with that name exists under the root.
    pub fn load(&self, name: &str) -> Result<Arc<Databank>, ServiceError> {
        if let Some(db) = self.open.read().expect("databank table lock").get(name) {
            return Ok(db.clone());
        }

        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(ServiceError::not_found(format!(
                "databank {name} not found under {}",
                self.root.display()
            )));
        }

        let mut open = self.open.write().expect("databank table lock");
        // A racing loader may have inserted the handle in the meantime.
        let db = open
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(databank = name, dir = %dir.display(), "databank opened");
                Arc::new(Databank {
                    name: name.to_string(),
                    dir,
                })
            })
            .clone();
        Ok(db)
    }
}
