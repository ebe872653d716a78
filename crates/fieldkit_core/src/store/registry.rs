//! In-memory schema registry.
//!
//! # Responsibility
//! - Hold the session's single source of truth: table name mapped to its
//!   definition.
//! - Compute the schema-persistence plan atomically with registration
//!   during first-run bootstrap.
//!
//! # Invariants
//! - A table name registers at most once per session; re-registration is
//!   refused, never overwritten.
//! - Definitions are immutable once registered.
//! - The lock is never held across an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::schema::{is_reserved_name, TableDefinition, SCHEMA_TABLE};
use crate::store::{StoreError, StoreResult};

/// Session-owned mapping of table name to definition.
pub struct SchemaRegistry {
    tables: RwLock<HashMap<String, TableDefinition>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a definition, refusing duplicates.
    ///
    /// # Errors
    /// - [`StoreError::DuplicateDefinition`] when the name is already
    ///   registered; the existing definition is left untouched.
    pub fn register(&self, definition: TableDefinition) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(|err| err.into_inner());
        if tables.contains_key(&definition.name) {
            return Err(StoreError::DuplicateDefinition(definition.name));
        }
        tables.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Registers a definition and returns which table schemas must now be
    /// persisted, both decided under one lock.
    ///
    /// The plan resolves the bootstrap ordering hazard: tables registered
    /// before the metadata table exists are swept up the moment the metadata
    /// table itself registers; afterwards every newcomer persists itself.
    pub fn register_for_bootstrap(
        &self,
        definition: TableDefinition,
    ) -> StoreResult<Vec<String>> {
        let mut tables = self.tables.write().unwrap_or_else(|err| err.into_inner());
        if tables.contains_key(&definition.name) {
            return Err(StoreError::DuplicateDefinition(definition.name));
        }
        let name = definition.name.clone();
        tables.insert(name.clone(), definition);

        let plan = if name == SCHEMA_TABLE {
            let mut all: Vec<String> = tables.keys().cloned().collect();
            all.sort();
            all
        } else if tables.contains_key(SCHEMA_TABLE) {
            vec![name]
        } else {
            Vec::new()
        };
        Ok(plan)
    }

    /// Returns a snapshot of the definition for `name`.
    pub fn get(&self, name: &str) -> Option<TableDefinition> {
        self.tables
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns registered names outside the reserved bookkeeping namespace,
    /// sorted for stable presentation.
    pub fn user_table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .keys()
            .filter(|name| !is_reserved_name(name))
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
