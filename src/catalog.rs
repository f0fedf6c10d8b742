// ABOUTME: Object catalog of the source org, keyed by logical path
// ABOUTME: Resolves task list entries to platform object ids before any job runs

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::{error, info, warn};

use crate::error::PromoterError;
use crate::remote::{ObjectRecord, Platform};
use crate::tasks::MigrationTask;

/// Object types listed by default, in merge order.
pub const DEFAULT_OBJECT_TYPES: &[&str] = &[
    "Mapping",
    "MTT",
    "TASKFLOW",
    "AI_SERVICE_CONNECTOR",
    "PROCESS",
    "AI_CONNECTION",
];

/// Lists objects of one type. A failed call is logged and yields an empty
/// list; the gap surfaces later as unresolved tasks.
pub async fn list_objects_by_type(platform: &dyn Platform, object_type: &str) -> Vec<ObjectRecord> {
    match platform.list_objects(object_type).await {
        Ok(objects) => objects,
        Err(e) => {
            error!(object_type, error = %e, "Failed to list objects");
            Vec::new()
        }
    }
}

/// Path to id lookup built from one or more object listings.
///
/// Ids are also kept per object type, so a task naming its type resolves to
/// that type's object even when another listing reused the path.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
    typed: HashMap<(String, String), String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a listing; an entry already present under the same path is replaced.
    pub fn merge(&mut self, object_type: &str, objects: Vec<ObjectRecord>) {
        for object in objects {
            self.typed.insert(
                (object.path.clone(), object_type.to_ascii_uppercase()),
                object.id.clone(),
            );
            if let Some(previous) = self.entries.insert(object.path.clone(), object.id.clone()) {
                if previous != object.id {
                    warn!(
                        path = %object.path,
                        object_type,
                        previous_id = %previous,
                        id = %object.id,
                        "Catalog path collision, later object type wins for untyped tasks"
                    );
                }
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// The id listed under `object_type`, falling back to the path alone.
    pub fn get_typed(&self, path: &str, object_type: &str) -> Option<&str> {
        if !object_type.is_empty() {
            let key = (path.to_string(), object_type.to_ascii_uppercase());
            if let Some(id) = self.typed.get(&key) {
                return Some(id.as_str());
            }
        }
        self.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up every task. Duplicate paths collapse onto the first occurrence.
    pub fn resolve(&self, tasks: &[MigrationTask]) -> Resolution {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for task in tasks {
            let path = task.path();
            if !seen.insert(path.clone()) {
                continue;
            }
            let id = self.get_typed(&path, &task.object_type).map(str::to_string);
            entries.push(ResolvedEntry {
                path,
                name: task.object_name.clone(),
                id,
            });
        }
        Resolution { entries }
    }
}

/// Builds the catalog from the listings of `types`, in order.
pub async fn build_catalog(platform: &dyn Platform, types: &[String]) -> Catalog {
    let mut catalog = Catalog::new();
    for object_type in types {
        let objects = list_objects_by_type(platform, object_type).await;
        info!(object_type = %object_type, count = objects.len(), "Added objects to catalog");
        catalog.merge(object_type, objects);
    }
    catalog
}

/// One task's lookup result; `id` is `None` when the path is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub path: String,
    pub name: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    pub path: String,
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    entries: Vec<ResolvedEntry>,
}

impl Resolution {
    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    pub fn unresolved(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.id.is_none())
            .map(|entry| entry.path.clone())
            .collect()
    }

    /// All objects, or `PromoterError::Unresolved` naming every missing path.
    pub fn into_objects(self) -> Result<Vec<ResolvedObject>> {
        let missing = self.unresolved();
        if !missing.is_empty() {
            for path in &missing {
                error!(path = %path, "Object id not found");
            }
            return Err(PromoterError::Unresolved(missing).into());
        }

        Ok(self
            .entries
            .into_iter()
            .filter_map(|entry| {
                entry.id.map(|id| ResolvedObject {
                    path: entry.path,
                    name: entry.name,
                    id,
                })
            })
            .collect())
    }
}
