use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::ast::CallSite;
use crate::error::EvalError;
use crate::plugin::{FunctionArity, FunctionRecord, PluginFunction};
use crate::value::{Value, ValueData};

fn as_long(v: &Value, fun_name: &str) -> Result<i64, EvalError> {
    match &v.data {
        ValueData::Long(n) => Ok(*n),
        ValueData::Double(d) => Ok(*d as i64),
        _ => Err(EvalError::TypeMismatch {
            fun_name: fun_name.to_string(),
            expected: "numeric",
        }),
    }
}

/// `oph_id(id, size)`: the explicit-dimension identity mapping used when a
/// dataset axis carries its own index values rather than an implicit
/// range (original `oph_query_expression_functions.c`, grounded in the
/// symtable registration in `oph_query_expr_evaluator.c`). The
/// registered arity is fixed at 2; `size` is accepted but unused by the
/// identity mapping, matching the function-body names retrieved only as
/// signatures.
struct OphId;
impl PluginFunction for OphId {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Fixed(2)
    }
    fn compute(&self, args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        Ok(Value::long(as_long(&args[0], "oph_id")?))
    }
}

struct OphId2;
impl PluginFunction for OphId2 {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Fixed(3)
    }
    fn compute(&self, args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        Ok(Value::long(as_long(&args[0], "oph_id2")?))
    }
}

struct OphId3;
impl PluginFunction for OphId3 {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Fixed(3)
    }
    fn compute(&self, args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        Ok(Value::long(as_long(&args[0], "oph_id3")?))
    }
}

/// `oph_is_in_subset(id, start, stop, step)`: membership test against a
/// strided range, returning `1`/`0` (original function used by subset
/// filters over explicit dimensions).
struct OphIsInSubset;
impl PluginFunction for OphIsInSubset {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Fixed(4)
    }
    fn compute(&self, args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        let id = as_long(&args[0], "oph_is_in_subset")?;
        let start = as_long(&args[1], "oph_is_in_subset")?;
        let stop = as_long(&args[2], "oph_is_in_subset")?;
        let step = as_long(&args[3], "oph_is_in_subset")?.max(1);
        let in_range = id >= start && id <= stop && (id - start) % step == 0;
        Ok(Value::long(in_range as i64))
    }
}

/// `oph_id_to_index2(id, width, offset)` / `oph_id_to_index(id, width,
/// ...)`: row-major index-from-identifier conversion. Grounded on the
/// worked example `oph_id_to_index(7, 6) == 1` (`7 % 6 == 1`); the
/// variadic form folds any trailing arguments into the same `id % width`
/// formula since the original function bodies were not retrieved.
struct OphIdToIndex2;
impl PluginFunction for OphIdToIndex2 {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Fixed(3)
    }
    fn compute(&self, args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        let id = as_long(&args[0], "oph_id_to_index2")?;
        let width = as_long(&args[1], "oph_id_to_index2")?;
        if width == 0 {
            return Err(EvalError::Plugin {
                name: "oph_id_to_index2".to_string(),
                reason: "width is zero".to_string(),
            });
        }
        Ok(Value::long(id % width))
    }
}

struct OphIdToIndex;
impl PluginFunction for OphIdToIndex {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Variadic { min: 2 }
    }
    fn compute(&self, args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        let id = as_long(&args[0], "oph_id_to_index")?;
        let width = as_long(&args[1], "oph_id_to_index")?;
        if width == 0 {
            return Err(EvalError::Plugin {
                name: "oph_id_to_index".to_string(),
                reason: "width is zero".to_string(),
            });
        }
        Ok(Value::long(id % width))
    }
}

/// `one(a, b)`: the generic two-argument test double referenced in the
/// symtable as `oph_query_generic_double`, registered under the name
/// `one` and always returning `1.0`.
struct OphQueryGenericDouble;
impl PluginFunction for OphQueryGenericDouble {
    fn arity(&self) -> FunctionArity {
        FunctionArity::Fixed(2)
    }
    fn compute(&self, _args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
        Ok(Value::double(1.0))
    }
}

struct BuiltinDef {
    name: &'static str,
    plugin: fn() -> Arc<dyn PluginFunction>,
}

static BUILTIN_DEFS: &[BuiltinDef] = &[
    BuiltinDef { name: "oph_id", plugin: || Arc::new(OphId) },
    BuiltinDef { name: "oph_id2", plugin: || Arc::new(OphId2) },
    BuiltinDef { name: "oph_id3", plugin: || Arc::new(OphId3) },
    BuiltinDef {
        name: "oph_is_in_subset",
        plugin: || Arc::new(OphIsInSubset),
    },
    BuiltinDef {
        name: "oph_id_to_index2",
        plugin: || Arc::new(OphIdToIndex2),
    },
    BuiltinDef {
        name: "oph_id_to_index",
        plugin: || Arc::new(OphIdToIndex),
    },
    BuiltinDef {
        name: "one",
        plugin: || Arc::new(OphQueryGenericDouble),
    },
];

/// Process-wide table of built-in functions, populated once and shared
/// read-only across every [`SymbolTable`] (`spec.md` §4.4: "the built-in
/// table is process-wide and read-only after init").
static BUILTINS: Lazy<Vec<(&'static str, Arc<dyn PluginFunction>)>> = Lazy::new(|| {
    BUILTIN_DEFS
        .iter()
        .map(|def| (def.name, (def.plugin)()))
        .collect()
});

/// Looks up a built-in by name. Consulted before a query's own symbol
/// table (`spec.md` §4.3: built-ins resolve first, with no shadowing by
/// a user-registered function of the same name), so built-ins are kept
/// in this process-wide table rather than copied into each
/// [`SymbolTable`](crate::symtable::SymbolTable).
pub fn lookup_builtin(name: &str) -> Option<FunctionRecord> {
    BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, plugin)| FunctionRecord {
        arity: plugin.arity(),
        plugin: plugin.clone(),
    })
}
