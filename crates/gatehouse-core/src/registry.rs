//! Name-keyed registry of operations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    verify::ArgumentSchema,
};

use crate::traits::Operation;

/// Signature of a closure-backed operation.
pub type OperationFn = Box<dyn Fn(&Map<String, Value>) -> GatehouseResult<Value> + Send + Sync>;

/// An `Operation` built from a closure.
pub struct FnOperation {
    name: String,
    description: String,
    schema: ArgumentSchema,
    func: OperationFn,
}

impl FnOperation {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        func: impl Fn(&Map<String, Value>) -> GatehouseResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ArgumentSchema::default(),
            func: Box::new(func),
        }
    }

    /// Attach an argument schema checked before every invocation.
    pub fn with_schema(mut self, schema: ArgumentSchema) -> Self {
        self.schema = schema;
        self
    }
}

impl Operation for FnOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn argument_schema(&self) -> ArgumentSchema {
        self.schema.clone()
    }

    fn invoke(&self, arguments: &Map<String, Value>) -> GatehouseResult<Value> {
        (self.func)(arguments)
    }
}

/// Static mapping from action name to operation.
///
/// Built once at startup. Registering a name twice replaces the earlier
/// operation.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation: impl Operation + 'static) -> &mut Self {
        self.register_arc(Arc::new(operation))
    }

    pub fn register_arc(&mut self, operation: Arc<dyn Operation>) -> &mut Self {
        self.operations.insert(operation.name().to_string(), operation);
        self
    }

    /// Resolve `name`, or fail with `UnknownAction`.
    pub fn lookup(&self, name: &str) -> GatehouseResult<Arc<dyn Operation>> {
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| GatehouseError::UnknownAction { name: name.to_string() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Description for the review payload. Unknown names get a placeholder
    /// so the approver still sees the call; execution will reject it.
    pub fn describe(&self, name: &str) -> String {
        self.operations
            .get(name)
            .map(|op| op.description().to_string())
            .unwrap_or_else(|| format!("unregistered operation '{name}'"))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.operations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}
