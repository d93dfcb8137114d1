//! Scope-chain symbol model
//!
//! One generic scope stack shared by the semantic analyzer and the
//! executor; they differ only in what they store per symbol (declared
//! signatures versus live values). Variables and functions live in
//! separate namespaces, so a variable may share its name with a
//! function in the same scope.
//!
//! Resolution walks the chain innermost-out by iterating the stack in
//! reverse; absence is reported as `None`, and the callers decide which
//! error that means in their phase.

use std::collections::HashMap;

/// A symbol that knows its own name.
pub trait Named {
    fn name(&self) -> &str;
}

/// One lexical scope: its variable and function bindings.
#[derive(Debug, Default)]
pub struct Scope<V, F> {
    vars: HashMap<String, V>,
    funcs: HashMap<String, F>,
}

impl<V, F> Scope<V, F> {
    fn new() -> Self {
        Self {
            vars: HashMap::new(),
            funcs: HashMap::new(),
        }
    }
}

/// The scope chain, innermost scope last.
#[derive(Debug)]
pub struct ScopeStack<V, F> {
    scopes: Vec<Scope<V, F>>,
}

impl<V: Named, F: Named> ScopeStack<V, F> {
    /// An empty chain. Callers push the root scope themselves so the
    /// push/pop pairing stays uniform.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind a variable in the innermost scope. Duplicate detection is
    /// the caller's responsibility via `var_in_innermost`.
    pub fn declare_var(&mut self, var: V) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.vars.insert(var.name().to_string(), var);
        }
    }

    pub fn declare_func(&mut self, func: F) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.funcs.insert(func.name().to_string(), func);
        }
    }

    pub fn var_in_innermost(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|s| s.vars.contains_key(name))
            .unwrap_or(false)
    }

    pub fn func_in_innermost(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|s| s.funcs.contains_key(name))
            .unwrap_or(false)
    }

    /// Find a variable, innermost scope first.
    pub fn resolve_var(&self, name: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|s| s.vars.get(name))
    }

    /// Mutable variant for the assignment path: the binding is updated
    /// where it was declared, not re-bound in the innermost scope.
    pub fn resolve_var_mut(&mut self, name: &str) -> Option<&mut V> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|s| s.vars.get_mut(name))
    }

    pub fn resolve_func(&self, name: &str) -> Option<&F> {
        self.scopes.iter().rev().find_map(|s| s.funcs.get(name))
    }

    /// The innermost scope's variable bindings, for error dumps.
    pub fn innermost_vars(&self) -> impl Iterator<Item = &V> {
        self.scopes.last().into_iter().flat_map(|s| s.vars.values())
    }
}

impl<V: Named, F: Named> Default for ScopeStack<V, F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Sym {
        id: String,
        value: i64,
    }

    impl Named for Sym {
        fn name(&self) -> &str {
            &self.id
        }
    }

    fn sym(id: &str, value: i64) -> Sym {
        Sym {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn test_resolution_walks_outward() {
        let mut stack: ScopeStack<Sym, Sym> = ScopeStack::new();
        stack.push_scope();
        stack.declare_var(sym("x", 1));
        stack.push_scope();

        // Not in the innermost scope, but resolvable through the chain.
        assert!(!stack.var_in_innermost("x"));
        assert_eq!(stack.resolve_var("x").map(|s| s.value), Some(1));
        assert_eq!(stack.resolve_var("y"), None);
    }

    #[test]
    fn test_shadowing_and_unshadowing() {
        let mut stack: ScopeStack<Sym, Sym> = ScopeStack::new();
        stack.push_scope();
        stack.declare_var(sym("x", 1));
        stack.push_scope();
        stack.declare_var(sym("x", 2));

        assert_eq!(stack.resolve_var("x").map(|s| s.value), Some(2));
        stack.pop_scope();
        assert_eq!(stack.resolve_var("x").map(|s| s.value), Some(1));
    }

    #[test]
    fn test_mutation_hits_declaration_site() {
        let mut stack: ScopeStack<Sym, Sym> = ScopeStack::new();
        stack.push_scope();
        stack.declare_var(sym("x", 1));
        stack.push_scope();

        if let Some(var) = stack.resolve_var_mut("x") {
            var.value = 9;
        }
        stack.pop_scope();
        assert_eq!(stack.resolve_var("x").map(|s| s.value), Some(9));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut stack: ScopeStack<Sym, Sym> = ScopeStack::new();
        stack.push_scope();
        stack.declare_var(sym("f", 1));
        stack.declare_func(sym("f", 2));

        assert_eq!(stack.resolve_var("f").map(|s| s.value), Some(1));
        assert_eq!(stack.resolve_func("f").map(|s| s.value), Some(2));
    }
}
