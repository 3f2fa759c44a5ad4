use crate::ast::{AstNode, BinOp, UnaryOp};
use crate::builtins::lookup_builtin;
use crate::error::EvalError;
use crate::plugin::FunctionRecord;
use crate::symtable::{SymbolEntry, SymbolTable};
use crate::value::{Value, ValueData};

fn as_f64(v: &Value) -> f64 {
    match &v.data {
        ValueData::Long(n) => *n as f64,
        ValueData::Double(d) => *d,
        ValueData::Null => 0.0,
        ValueData::String(_) | ValueData::Binary(_) => 0.0,
    }
}

/// Evaluates `node` against `table`. `skip` carries the short-circuit
/// signal down from an enclosing `And`/`Or` (`spec.md` §4.3, property
/// P6): when `skip` is set, function calls are not invoked and instead
/// resolve to [`Value::jump_zero`], mirroring the C evaluator's
/// `jump_flag`.
fn eval_with_skip(node: &AstNode, table: &SymbolTable, skip: bool) -> Result<Value, EvalError> {
    match node {
        AstNode::Value(v) => {
            let mut out = v.clone();
            out.jump_flag = skip;
            Ok(out)
        }
        AstNode::Var(name) => match table.lookup(name) {
            Some(SymbolEntry::Variable(v)) => {
                let mut out = v.clone();
                out.jump_flag = skip;
                Ok(out)
            }
            Some(SymbolEntry::Function(_)) => Err(EvalError::TypeMismatch {
                fun_name: name.clone(),
                expected: "variable",
            }),
            None => Err(EvalError::UnknownSymbol(name.clone())),
        },
        AstNode::Fun { name, args, site } => {
            if skip {
                return Ok(Value::jump_zero());
            }
            // Built-ins are resolved before the query's own symbol table
            // and never shadowed by a same-named user registration,
            // mirroring `oph_query_expr_lookup(name, oph_function_table)`
            // falling back to `table` only on a built-in miss.
            let record = if let Some(builtin) = lookup_builtin(name) {
                builtin
            } else {
                match table.lookup(name) {
                    Some(SymbolEntry::Function(record)) => FunctionRecord {
                        arity: record.arity,
                        plugin: record.plugin.clone(),
                    },
                    Some(SymbolEntry::Variable(_)) => {
                        return Err(EvalError::TypeMismatch {
                            fun_name: name.clone(),
                            expected: "function",
                        })
                    }
                    None => return Err(EvalError::UnknownSymbol(name.clone())),
                }
            };
            if !record.arity.accepts(args.len()) {
                return Err(EvalError::Arity {
                    name: name.clone(),
                    expected: record.arity.describe(),
                    got: args.len(),
                });
            }
            // Evaluated right to left, assembled left to right, mirroring
            // `get_array_args` in the original evaluator.
            let mut values: Vec<Option<Value>> = (0..args.len()).map(|_| None).collect();
            for i in (0..args.len()).rev() {
                values[i] = Some(eval_with_skip(&args[i], table, false)?);
            }
            let values: Vec<Value> = values.into_iter().map(|v| v.expect("filled above")).collect();

            let mut site_guard = site.lock();
            if !site_guard.initialized {
                site_guard.initialized = true;
            }
            tracing::trace!(function = %name, arg_count = values.len(), "invoking plugin function");
            record
                .plugin
                .compute(&values, &mut site_guard)
                .map_err(|e| match e {
                    EvalError::Plugin { .. } => e,
                    other => EvalError::Plugin {
                        name: name.clone(),
                        reason: other.to_string(),
                    },
                })
        }
        AstNode::BinOp(BinOp::And, l, r) => {
            let lv = eval_with_skip(l, table, skip)?;
            let lt = lv.is_truthy();
            let rv = eval_with_skip(r, table, skip || !lt)?;
            Ok(Value {
                data: ValueData::Long((lt && rv.is_truthy()) as i64),
                owned: true,
                jump_flag: skip,
            })
        }
        AstNode::BinOp(BinOp::Or, l, r) => {
            let lv = eval_with_skip(l, table, skip)?;
            let lt = lv.is_truthy();
            let rv = eval_with_skip(r, table, skip || lt)?;
            Ok(Value {
                data: ValueData::Long((lt || rv.is_truthy()) as i64),
                owned: true,
                jump_flag: skip,
            })
        }
        AstNode::BinOp(op, l, r) => {
            let lv = eval_with_skip(l, table, skip)?;
            let rv = eval_with_skip(r, table, skip)?;
            let (a, b) = (as_f64(&lv), as_f64(&rv));
            let data = match op {
                BinOp::Add => ValueData::Double(a + b),
                BinOp::Sub => ValueData::Double(a - b),
                BinOp::Mul => ValueData::Double(a * b),
                BinOp::Div => ValueData::Double(a / b),
                BinOp::Mod => {
                    let divisor = b as i64;
                    if divisor == 0 {
                        return Err(EvalError::DivideByZero);
                    }
                    ValueData::Long((a as i64) % divisor)
                }
                BinOp::Eq => ValueData::Long((a == b) as i64),
                BinOp::And | BinOp::Or => unreachable!("handled above"),
            };
            Ok(Value {
                data,
                owned: true,
                jump_flag: skip,
            })
        }
        AstNode::UnaryOp(UnaryOp::Not, r) => {
            let rv = eval_with_skip(r, table, skip)?;
            Ok(Value {
                data: ValueData::Long(!rv.is_truthy() as i64),
                owned: true,
                jump_flag: skip,
            })
        }
        AstNode::UnaryOp(UnaryOp::Neg, r) => {
            let rv = eval_with_skip(r, table, skip)?;
            Ok(Value {
                data: ValueData::Double(-as_f64(&rv)),
                owned: true,
                jump_flag: skip,
            })
        }
    }
}

/// Walks the tree post-order, calling [`crate::plugin::PluginFunction::clear`]
/// exactly once per call site (property P7), regardless of how many
/// times `teardown` is invoked on the same tree.
pub fn teardown(node: &AstNode, table: &SymbolTable) {
    match node {
        AstNode::Value(_) | AstNode::Var(_) => {}
        AstNode::Fun { name, args, site } => {
            for a in args {
                teardown(a, table);
            }
            let mut guard = site.lock();
            if guard.cleared {
                return;
            }
            if let Some(builtin) = lookup_builtin(name) {
                builtin.plugin.clear(&mut guard);
            } else if let Some(SymbolEntry::Function(record)) = table.lookup(name) {
                record.plugin.clear(&mut guard);
            }
            guard.cleared = true;
        }
        AstNode::BinOp(_, l, r) => {
            teardown(l, table);
            teardown(r, table);
        }
        AstNode::UnaryOp(_, r) => teardown(r, table),
    }
}

/// Public evaluation entry point. Any internal failure collapses to
/// [`EvalError::Parse`], mirroring `oph_query_expr_eval_expression`'s
/// single `PARSE_ERROR` return code.
pub fn eval_expression(node: &AstNode, table: &SymbolTable) -> Result<Value, EvalError> {
    eval_with_skip(node, table, false).map_err(|e| EvalError::Parse(e.to_string()))
}
