use crate::ast::CallSite;
use crate::error::EvalError;
use crate::value::Value;

/// Fixed-arity functions fail when the provided argument count differs
/// from `n`; variadic functions fail when fewer than `n` are provided
/// (`spec.md` §4.3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionArity {
    Fixed(usize),
    Variadic { min: usize },
}

impl FunctionArity {
    pub fn accepts(self, provided: usize) -> bool {
        match self {
            FunctionArity::Fixed(n) => provided == n,
            FunctionArity::Variadic { min } => provided >= min,
        }
    }

    pub fn describe(self) -> String {
        match self {
            FunctionArity::Fixed(n) => n.to_string(),
            FunctionArity::Variadic { min } => format!("at least {min}"),
        }
    }
}

/// The calling convention for a user-defined scalar/aggregate function
/// (`spec.md` §4.4). A call site's [`CallSite`] is threaded through so a
/// stateful aggregate can recognize its first invocation and its
/// teardown call.
pub trait PluginFunction: Send + Sync {
    fn arity(&self) -> FunctionArity;

    /// `args` is already arity-checked and short-circuit-checked by the
    /// evaluator; `first=1` (`site.initialized == false`) on the first
    /// call at a given site.
    fn compute(&self, args: &[Value], site: &mut CallSite) -> Result<Value, EvalError>;

    /// Called with `first=1, error=1` and no arguments during AST
    /// teardown, so the plugin can release any per-call-site state. The
    /// default is a no-op, appropriate for stateless functions.
    fn clear(&self, _site: &mut CallSite) {}
}

pub struct FunctionRecord {
    pub arity: FunctionArity,
    pub plugin: std::sync::Arc<dyn PluginFunction>,
}
