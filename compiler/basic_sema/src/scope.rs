//! Scope stack and rename bookkeeping.

use basic_ir::Type;
use rustc_hash::FxHashMap;

/// One binding in a scope, keyed by its source spelling.
#[derive(Clone, Debug)]
pub(crate) struct Binding {
    /// Globally unique name after scoped rename. Program-scope bindings
    /// keep their source spelling.
    pub unique: String,
    pub ty: Type,
    pub is_array: bool,
    pub is_shared: bool,
}

#[derive(Default)]
pub(crate) struct Scope {
    bindings: FxHashMap<String, Binding>,
}

/// Lexical scope stack. The bottom scope is the program scope; procedure
/// bodies and `SELECT CASE` arms push local scopes on top.
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
    /// Per-procedure rename counter: the `N` of the next `_N` suffix.
    counter: u32,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::default()],
            counter: 0,
        }
    }

    /// Enter a procedure body: fresh local scope, counter reset.
    pub(crate) fn enter_proc(&mut self) {
        self.scopes.push(Scope::default());
        self.counter = 0;
    }

    /// Enter a nested local scope (SELECT CASE arm); the rename counter
    /// keeps increasing so uniqueness holds across the whole procedure.
    pub(crate) fn enter_block(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Leave the innermost scope, returning its bindings for the symbol
    /// table.
    pub(crate) fn exit(&mut self) -> Vec<Binding> {
        let scope = self.scopes.pop().unwrap_or_default();
        scope.bindings.into_values().collect()
    }

    /// Whether the innermost scope is the program scope.
    pub(crate) fn at_program_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Declare a binding in the innermost scope. Local bindings get the
    /// next `_N` suffix; program-scope bindings keep their spelling.
    /// Returns the unique name, or `None` when the name is already bound
    /// in this scope (duplicate declaration).
    pub(crate) fn declare(&mut self, name: &str, ty: Type, is_array: bool) -> Option<String> {
        let local = !self.at_program_scope();
        let scope = self.scopes.last_mut()?;
        if scope.bindings.contains_key(name) {
            return None;
        }
        let unique = if local {
            let unique = format!("{}_{}", name, self.counter);
            self.counter += 1;
            unique
        } else {
            name.to_string()
        };
        scope.bindings.insert(
            name.to_string(),
            Binding {
                unique: unique.clone(),
                ty,
                is_array,
                is_shared: false,
            },
        );
        Some(unique)
    }

    /// Declare a `SHARED` passthrough: the name resolves upward to the
    /// program scope without rename.
    pub(crate) fn declare_shared(&mut self, name: &str, ty: Type, is_array: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(
                name.to_string(),
                Binding {
                    unique: name.to_string(),
                    ty,
                    is_array,
                    is_shared: true,
                },
            );
        }
    }

    /// Resolve a name through the scope chain, innermost first.
    pub(crate) fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    /// Resolve a name in the program scope only.
    pub(crate) fn lookup_program(&self, name: &str) -> Option<&Binding> {
        self.scopes.first().and_then(|s| s.bindings.get(name))
    }

    /// Declare a binding directly in the program scope (used by `SHARED`
    /// when the shared name has no prior program-scope declaration).
    pub(crate) fn declare_program(&mut self, name: &str, ty: Type, is_array: bool) {
        if let Some(scope) = self.scopes.first_mut() {
            scope.bindings.entry(name.to_string()).or_insert(Binding {
                unique: name.to_string(),
                ty,
                is_array,
                is_shared: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_scope_keeps_spelling() {
        let mut scopes = ScopeStack::new();
        assert_eq!(
            scopes.declare("X", Type::I64, false),
            Some("X".to_string())
        );
        assert_eq!(scopes.declare("X", Type::I64, false), None);
    }

    #[test]
    fn test_proc_locals_get_suffixes_in_order() {
        let mut scopes = ScopeStack::new();
        scopes.enter_proc();
        assert_eq!(
            scopes.declare("ARR", Type::I64, true),
            Some("ARR_0".to_string())
        );
        assert_eq!(
            scopes.declare("NAME$", Type::Str, false),
            Some("NAME$_1".to_string())
        );
        assert_eq!(
            scopes.declare("I", Type::I64, false),
            Some("I_2".to_string())
        );
    }

    #[test]
    fn test_counter_resets_per_procedure() {
        let mut scopes = ScopeStack::new();
        scopes.enter_proc();
        assert_eq!(
            scopes.declare("A", Type::I64, false),
            Some("A_0".to_string())
        );
        scopes.exit();
        scopes.enter_proc();
        assert_eq!(
            scopes.declare("B", Type::I64, false),
            Some("B_0".to_string())
        );
    }

    #[test]
    fn test_shared_resolves_without_rename() {
        let mut scopes = ScopeStack::new();
        scopes.declare("TOTAL", Type::I64, false);
        scopes.enter_proc();
        scopes.declare_shared("TOTAL", Type::I64, false);
        let binding = scopes.lookup("TOTAL").expect("binding");
        assert_eq!(binding.unique, "TOTAL");
        assert!(binding.is_shared);
    }
}
