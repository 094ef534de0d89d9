//! Function registry: loads function groups and serves declarations.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use signalforge_core::context::RequestContext;
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::error::FunctionError;
use signalforge_core::function::{FunctionEntry, FunctionGroup};
use signalforge_core::provider::FunctionDeclaration;
use tracing::{debug, info, warn};

use crate::validate::validate_arguments;

/// Named function groups available for loading.
#[derive(Clone, Default)]
pub struct GroupCatalog {
    groups: IndexMap<String, Arc<dyn FunctionGroup>>,
}

impl GroupCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Replaces any existing group with the same name.
    pub fn register(&mut self, group: Arc<dyn FunctionGroup>) {
        self.groups.insert(group.name().to_string(), group);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionGroup>> {
        self.groups.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }
}

impl std::fmt::Debug for GroupCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.groups.keys()).finish()
    }
}

type CacheKey = (Vec<String>, Option<Vec<String>>);

/// Loaded function entries for one request.
///
/// Entries keep load order: groups in the order they were first loaded,
/// functions in the order their group produced them. Reloading a group
/// replaces its entries in place.
pub struct FunctionRegistry {
    catalog: GroupCatalog,
    context: RequestContext,
    loaded: IndexMap<String, Vec<FunctionEntry>>,
    entries: IndexMap<String, FunctionEntry>,
    last: Mutex<Option<(CacheKey, Arc<Vec<FunctionDeclaration>>)>>,
}

impl FunctionRegistry {
    pub fn new(catalog: GroupCatalog, context: RequestContext) -> Self {
        Self {
            catalog,
            context,
            loaded: IndexMap::new(),
            entries: IndexMap::new(),
            last: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// (Re)load one group from the catalog.
    pub fn load_group(&mut self, name: &str) -> Result<(), FunctionError> {
        let group = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| FunctionError::GroupNotFound(name.to_string()))?;

        let entries = group.initialise(&self.context);
        info!(group = name, functions = entries.len(), "Loaded function group");
        self.loaded.insert(name.to_string(), entries);
        self.rebuild();
        Ok(())
    }

    /// (Re)load the named groups, or every catalog group when `None`.
    ///
    /// Fails on the first unknown name; groups before it stay loaded.
    pub fn load_groups(&mut self, names: Option<&[String]>) -> Result<(), FunctionError> {
        let names = match names {
            Some(names) => names.to_vec(),
            None => self.catalog.names(),
        };
        for name in &names {
            self.load_group(name)?;
        }
        Ok(())
    }

    /// Names of the loaded groups, in load order.
    pub fn loaded_groups(&self) -> Vec<String> {
        self.loaded.keys().cloned().collect()
    }

    /// Loaded function names in registry order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Result<&FunctionEntry, FunctionError> {
        self.entries.get(name).ok_or_else(|| FunctionError::NotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    /// Declarations for every loaded function, or only the named ones.
    ///
    /// Output follows registry order regardless of filter order. The last
    /// result is memoised against its loaded groups and filter.
    pub fn declarations(
        &self,
        filter: Option<&[String]>,
    ) -> Result<Arc<Vec<FunctionDeclaration>>, FunctionError> {
        if let Some(filter) = filter {
            for name in filter {
                self.resolve(name)?;
            }
        }

        let key: CacheKey = (self.loaded_groups(), filter.map(<[String]>::to_vec));
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, hit)) = last.as_ref().filter(|(cached, _)| *cached == key) {
            return Ok(Arc::clone(hit));
        }

        let declarations: Vec<FunctionDeclaration> = self
            .entries
            .values()
            .filter(|entry| filter.is_none_or(|f| f.contains(&entry.name)))
            .map(|entry| entry.declaration.clone())
            .collect();
        debug!(count = declarations.len(), "Computed function declarations");

        let declarations = Arc::new(declarations);
        *last = Some((key, Arc::clone(&declarations)));
        Ok(declarations)
    }

    /// Parse, validate and run a function call from the model.
    pub async fn invoke(
        &self,
        name: &str,
        raw_arguments: &str,
    ) -> Result<ResultEnvelope, FunctionError> {
        let entry = self.resolve(name)?;

        let arguments: serde_json::Value = if raw_arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw_arguments).map_err(|e| {
                FunctionError::InvalidArguments(format!("{name}: arguments are not valid JSON: {e}"))
            })?
        };

        validate_arguments(name, &entry.declaration.parameters, &arguments)?;

        debug!(function = name, group = %entry.group, "Invoking function");
        entry.call(arguments).await
    }

    fn rebuild(&mut self) {
        self.entries.clear();
        for (group, entries) in &self.loaded {
            for entry in entries {
                if let Some(previous) = self.entries.insert(entry.name.clone(), entry.clone()) {
                    warn!(
                        function = %entry.name,
                        previous_group = %previous.group,
                        group = %group,
                        "Function name registered twice; later group wins"
                    );
                }
            }
        }
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("catalog", &self.catalog)
            .field("functions", &self.names())
            .finish()
    }
}
