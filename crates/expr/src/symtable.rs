use std::collections::HashMap;

use crate::plugin::FunctionRecord;
use crate::value::Value;

/// An entry in a [`SymbolTable`]: either a bound variable value or a
/// registered function (`spec.md` §4.3, mirroring the C evaluator's
/// `oph_query_expr_symtable_add_variable`/`add_function`).
pub enum SymbolEntry {
    Variable(Value),
    Function(FunctionRecord),
}

/// Bindings an expression tree is evaluated against. One table is built
/// per query and shared across every node in the tree.
#[derive(Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), SymbolEntry::Variable(value));
    }

    pub fn add_function(&mut self, name: impl Into<String>, record: FunctionRecord) {
        self.entries.insert(name.into(), SymbolEntry::Function(record));
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) -> bool {
        match self.entries.get_mut(name) {
            Some(SymbolEntry::Variable(slot)) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }
}
