use indexmap::IndexMap;

use crate::functions::FunctionRegistry;
use crate::value::Value;

/// Variables and functions visible to an expression.
///
/// Contexts form a chain: a child shadows its parent and is dropped once the
/// comprehension or dynamic block that created it is done, so bindings never
/// leak into sibling expressions.
pub struct EvalContext<'p> {
    variables: IndexMap<String, Value>,
    parent: Option<&'p EvalContext<'p>>,
    functions: &'p FunctionRegistry,
    unknown_is_error: bool,
}

impl<'p> EvalContext<'p> {
    pub fn new(functions: &'p FunctionRegistry) -> Self {
        EvalContext {
            variables: IndexMap::new(),
            parent: None,
            functions,
            unknown_is_error: false,
        }
    }

    /// Treat unresolved references as hard errors instead of passing them through.
    pub fn strict(mut self, unknown_is_error: bool) -> Self {
        self.unknown_is_error = unknown_is_error;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Fresh scope shadowing this one.
    pub fn child(&self) -> EvalContext<'_> {
        EvalContext {
            variables: IndexMap::new(),
            parent: Some(self),
            functions: self.functions,
            unknown_is_error: self.unknown_is_error,
        }
    }

    /// Bind a name in this scope. Only used on freshly created children.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match self.variables.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|p| p.lookup(name)),
        }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        self.functions
    }

    pub fn unknown_is_error(&self) -> bool {
        self.unknown_is_error
    }
}
