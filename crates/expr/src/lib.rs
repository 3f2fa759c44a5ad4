mod ast;
mod builtins;
mod error;
mod eval;
mod plugin;
mod symtable;
mod value;

pub use ast::{AstNode, BinOp, CallSite, UnaryOp};
pub use builtins::lookup_builtin;
pub use error::EvalError;
pub use eval::{eval_expression, teardown};
pub use plugin::{FunctionArity, FunctionRecord, PluginFunction};
pub use symtable::{SymbolEntry, SymbolTable};
pub use value::{Value, ValueData};

/// A fresh table for a query's own variables and user-registered
/// functions. Built-ins are never copied in here: they live only in
/// [`lookup_builtin`]'s process-wide table and are always consulted
/// first, so a user registration can never shadow one.
pub fn new_symbol_table() -> SymbolTable {
    SymbolTable::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_arithmetic() {
        let table = new_symbol_table();
        let expr = AstNode::bin(
            BinOp::Add,
            AstNode::value(Value::long(2)),
            AstNode::value(Value::long(3)),
        );
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Double(5.0));
    }

    #[test]
    fn divide_is_true_division() {
        let table = new_symbol_table();
        let expr = AstNode::bin(
            BinOp::Div,
            AstNode::value(Value::long(7)),
            AstNode::value(Value::long(2)),
        );
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Double(3.5));
    }

    #[test]
    fn resolves_variables() {
        let mut table = new_symbol_table();
        table.add_variable("x", Value::long(41));
        let expr = AstNode::bin(
            BinOp::Add,
            AstNode::var("x"),
            AstNode::value(Value::long(1)),
        );
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Double(42.0));
    }

    #[test]
    fn unknown_symbol_collapses_to_parse_error() {
        let table = new_symbol_table();
        let expr = AstNode::var("missing");
        let err = eval_expression(&expr, &table).unwrap_err();
        assert!(matches!(err, EvalError::Parse(_)));
    }

    #[test]
    fn and_short_circuits_without_calling_the_plugin() {
        let table = new_symbol_table();
        let call = AstNode::call("one", vec![AstNode::value(Value::long(1)), AstNode::value(Value::long(2))]);
        let expr = AstNode::bin(BinOp::And, AstNode::value(Value::long(0)), call);
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Long(0));
        if let AstNode::BinOp(_, _, right) = &expr {
            teardown(right, &table);
        }
    }

    #[test]
    fn or_short_circuits_the_right_operand() {
        let table = new_symbol_table();
        let call = AstNode::call("one", vec![AstNode::value(Value::long(1)), AstNode::value(Value::long(2))]);
        let expr = AstNode::bin(BinOp::Or, AstNode::value(Value::long(1)), call);
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Long(1));
    }

    #[test]
    fn mod_converts_to_i64_and_returns_long() {
        let table = new_symbol_table();
        let expr = AstNode::bin(BinOp::Mod, AstNode::value(Value::long(7)), AstNode::value(Value::long(3)));
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Long(1));
    }

    #[test]
    fn mod_by_zero_is_a_typed_error() {
        let table = new_symbol_table();
        let expr = AstNode::bin(BinOp::Mod, AstNode::value(Value::long(7)), AstNode::value(Value::long(0)));
        let err = eval_expression(&expr, &table).unwrap_err();
        assert!(matches!(err, EvalError::Parse(_)));
    }

    #[test]
    fn builtin_is_never_shadowed_by_a_user_function() {
        struct AlwaysZero;
        impl PluginFunction for AlwaysZero {
            fn arity(&self) -> FunctionArity {
                FunctionArity::Fixed(2)
            }
            fn compute(&self, _args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
                Ok(Value::double(0.0))
            }
        }

        let mut table = new_symbol_table();
        table.add_function(
            "one",
            FunctionRecord {
                arity: FunctionArity::Fixed(2),
                plugin: std::sync::Arc::new(AlwaysZero),
            },
        );
        let expr = AstNode::call("one", vec![AstNode::value(Value::long(1)), AstNode::value(Value::long(2))]);
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Double(1.0), "the built-in `one` must win over the user registration");
    }

    #[test]
    fn id_to_index_matches_worked_example() {
        let table = new_symbol_table();
        let expr = AstNode::call(
            "oph_id_to_index",
            vec![AstNode::value(Value::long(7)), AstNode::value(Value::long(6))],
        );
        let result = eval_expression(&expr, &table).unwrap();
        assert_eq!(result.data, ValueData::Long(1));
    }

    #[test]
    fn teardown_clears_each_call_site_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct CountingClear(Arc<AtomicUsize>);
        impl PluginFunction for CountingClear {
            fn arity(&self) -> FunctionArity {
                FunctionArity::Fixed(0)
            }
            fn compute(&self, _args: &[Value], _site: &mut CallSite) -> Result<Value, EvalError> {
                Ok(Value::long(1))
            }
            fn clear(&self, _site: &mut CallSite) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(AtomicUsize::new(0));
        let mut table = new_symbol_table();
        table.add_function(
            "counted",
            FunctionRecord {
                arity: FunctionArity::Fixed(0),
                plugin: Arc::new(CountingClear(counter.clone())),
            },
        );
        let expr = AstNode::call("counted", vec![]);
        eval_expression(&expr, &table).unwrap();
        teardown(&expr, &table);
        teardown(&expr, &table);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    proptest::proptest! {
        /// Property P6: for any pair of long literals, `And`/`Or` agree
        /// with plain boolean logic over their truthiness, regardless of
        /// the short-circuit path taken to get there.
        #[test]
        fn and_or_truth_tables_match_boolean_logic(a in proptest::prelude::any::<i64>(), b in proptest::prelude::any::<i64>()) {
            let table = new_symbol_table();
            let lit = |v: i64| AstNode::value(Value::long(v));
            let and_expr = AstNode::bin(BinOp::And, lit(a), lit(b));
            let or_expr = AstNode::bin(BinOp::Or, lit(a), lit(b));

            let and_result = eval_expression(&and_expr, &table).unwrap();
            let or_result = eval_expression(&or_expr, &table).unwrap();

            proptest::prop_assert_eq!(and_result.data, ValueData::Long(((a != 0) && (b != 0)) as i64));
            proptest::prop_assert_eq!(or_result.data, ValueData::Long(((a != 0) || (b != 0)) as i64));
        }
    }
}
