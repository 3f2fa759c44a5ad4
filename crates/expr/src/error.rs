use thiserror::Error;

/// Evaluator failures, before they cross the public `eval_expression`
/// boundary and collapse to [`EvalError::Parse`] (`spec.md` §4.3, §7).
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),

    #[error("function `{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("argument to `{fun_name}` has the wrong type, expected {expected}")]
    TypeMismatch { fun_name: String, expected: &'static str },

    #[error("plugin function `{name}` failed: {reason}")]
    Plugin { name: String, reason: String },

    #[error("modulo by zero")]
    DivideByZero,

    #[error("expression evaluation failed: {0}")]
    Parse(String),
}
