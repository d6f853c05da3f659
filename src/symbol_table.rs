use std::collections::HashMap;

use crate::annotations::AnnotationIndex;
use crate::fir::{DataKind, FlowNode};

pub type ScopeId = usize;
pub type SymbolId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: DataKind,
    pub is_array: bool,
    pub capacity: Option<usize>,
}

impl Symbol {
    /// The `Declare` node introducing this symbol.
    pub fn declare_node(&self) -> FlowNode {
        FlowNode::Declare {
            name: self.name.clone(),
            kind: self.kind,
            is_array: self.is_array,
            size: if self.is_array { self.capacity } else { None },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeKind {
    Global,
    Function { name: String },
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub symbols: HashMap<String, SymbolId>,
}

impl Scope {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            symbols: HashMap::new(),
        }
    }

    pub fn get_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }
}

/// Outcome of [`SymbolTable::declare_once`].
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub symbol: Symbol,
    pub is_new: bool,
}

impl Declaration {
    /// `Some(Declare)` only the first time a name is seen in its scope.
    pub fn declare_node(&self) -> Option<FlowNode> {
        self.is_new.then(|| self.symbol.declare_node())
    }
}

/// Variables of one conversion run. Each translated function body gets its
/// own scope; within a scope a name's first resolution is final.
#[derive(Debug)]
pub struct SymbolTable<'a> {
    annotations: &'a AnnotationIndex,
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current_scope: ScopeId,
}

impl<'a> SymbolTable<'a> {
    pub fn new(annotations: &'a AnnotationIndex) -> Self {
        Self {
            annotations,
            scopes: vec![Scope::new(ScopeKind::Global, None)],
            symbols: Vec::new(),
            current_scope: 0,
        }
    }

    pub fn annotations(&self) -> &'a AnnotationIndex {
        self.annotations
    }

    pub fn enter_function_scope(&mut self, name: &str) -> ScopeId {
        let scope_id = self.scopes.len();
        self.scopes.push(Scope::new(
            ScopeKind::Function {
                name: name.to_string(),
            },
            Some(self.current_scope),
        ));
        self.current_scope = scope_id;
        scope_id
    }

    pub fn exit_scope(&mut self) -> ScopeId {
        let scope = &self.scopes[self.current_scope];
        if let ScopeKind::Function { name } = &scope.kind {
            log::debug!("leaving '{}' with {} variable(s)", name, scope.symbols.len());
        }
        if let Some(parent) = scope.parent {
            self.current_scope = parent;
        }
        self.current_scope
    }

    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current_scope]
            .get_symbol(name)
            .and_then(|id| self.get_symbol(id))
    }

    /// Resolve `name` in the current scope, declaring it on first use.
    ///
    /// Kind priority: annotation type hint, then `candidate`, then `Integer`.
    /// A capacity annotation overrides `capacity` and forces an array.
    /// For an existing name every argument is ignored.
    pub fn declare_once(
        &mut self,
        name: &str,
        candidate: Option<DataKind>,
        is_array: bool,
        capacity: Option<usize>,
    ) -> Declaration {
        if let Some(symbol) = self.lookup(name) {
            return Declaration {
                symbol: symbol.clone(),
                is_new: false,
            };
        }

        let kind = self
            .annotations
            .type_hint(name)
            .or(candidate)
            .unwrap_or(DataKind::Integer);
        let (is_array, capacity) = match self.annotations.capacity(name) {
            Some(size) => (true, Some(size)),
            None => (is_array, capacity),
        };

        let symbol = Symbol {
            name: name.to_string(),
            kind,
            is_array,
            capacity,
        };
        log::debug!("declared '{}' as {:?} (array: {})", name, kind, is_array);

        let symbol_id = self.symbols.len();
        self.symbols.push(symbol.clone());
        self.scopes[self.current_scope]
            .symbols
            .insert(name.to_string(), symbol_id);

        Declaration {
            symbol,
            is_new: true,
        }
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}
