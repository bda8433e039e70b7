//! `resource("<path>")` lookups for remote list filters
//!
//! A list filter may read another remote resource, which is resolved with
//! the full remote resolver. Values are cached for the duration of the
//! outermost listing, and a path that is still being resolved further up
//! the call chain is reported as a cycle instead of being fetched again.

use crate::traits::ResourceResolver;
use crate::{Error, Reconciler, Result};
use async_trait::async_trait;
use decl_meta::path::normalize_logical_path;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LookupTables {
    cache: HashMap<String, Value>,
    in_flight: HashSet<String>,
}

/// Lookup cache and in-flight set shared by nested listings.
#[derive(Debug, Default)]
pub(crate) struct LookupState {
    tables: Mutex<LookupTables>,
}

impl LookupState {
    fn tables(&self) -> MutexGuard<'_, LookupTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) struct ListResourceResolver {
    reconciler: Reconciler,
    state: Arc<LookupState>,
}

impl ListResourceResolver {
    /// Reuses the lookup state of `reconciler` when it is already serving
    /// a lookup.
    pub(crate) fn new(reconciler: &Reconciler) -> Self {
        let state = reconciler.lookups.clone().unwrap_or_default();
        let mut reconciler = reconciler.clone();
        reconciler.lookups = Some(state.clone());
        Self { reconciler, state }
    }
}

#[async_trait]
impl ResourceResolver for ListResourceResolver {
    async fn resolve_resource(&self, logical_path: &str) -> Result<Value> {
        let logical_path = normalize_logical_path(logical_path)?;
        {
            let mut tables = self.state.tables();
            if let Some(value) = tables.cache.get(&logical_path) {
                return Ok(value.clone());
            }
            if !tables.in_flight.insert(logical_path.clone()) {
                return Err(Error::validation(format!(
                    "resource() path {:?} creates a cyclic dependency",
                    logical_path
                )));
            }
        }

        tracing::debug!(path = %logical_path, "Resolving list filter resource");
        let resolved = self.reconciler.get_remote(&logical_path).await;

        let mut tables = self.state.tables();
        tables.in_flight.remove(&logical_path);
        if let Ok(value) = &resolved {
            tables.cache.insert(logical_path, value.clone());
        }
        resolved
    }
}
