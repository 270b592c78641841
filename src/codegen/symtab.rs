use std::collections::BTreeMap;

use super::info::SymbolInfo;

/// Index of a scope in the [`ScopeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeId(pub usize);

/// One scope: bindings plus a link to the enclosing scope.
#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: BTreeMap<String, SymbolInfo>,
}

/// All symbol tables of a program, arena-allocated so that scopes can
/// hold plain indices to their parents instead of owning references.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent,
            bindings: BTreeMap::new(),
        });
        id
    }

    /// Bind NAME in SCOPE, shadowing any binding in enclosing scopes and
    /// replacing any previous binding in SCOPE itself.
    pub fn bind(&mut self, scope: ScopeId, name: &str, info: SymbolInfo) {
        self.scopes[scope.0].bindings.insert(name.to_string(), info);
    }

    /// Look NAME up in SCOPE, walking the parent chain.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolInfo> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if let Some(info) = s.bindings.get(name) {
                return Some(*info);
            }
            current = s.parent;
        }
        None
    }

    /// Look NAME up in SCOPE alone, without walking parents.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolInfo> {
        self.scopes[scope.0].bindings.get(name).copied()
    }
}
