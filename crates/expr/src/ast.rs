use parking_lot::Mutex;

use crate::value::Value;

/// Binary arithmetic/comparison/logic operators (`spec.md` §4.3).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Mod,
    And,
    Or,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Per-call-site plugin bookkeeping (`spec.md` §4.4): whether the site has
/// been initialized, and whether its `clear` entry has already run. The
/// engine guarantees at most one `clear` call per site regardless of how
/// many times the tree is torn down.
#[derive(Default, Debug)]
pub struct CallSite {
    pub initialized: bool,
    pub cleared: bool,
}

/// The expression AST (`spec.md` §3 "Expression node", §9 Design Notes: a
/// sum type over `{Value, Var, Fun, BinOp, UnaryOp}`).
#[derive(Debug)]
pub enum AstNode {
    Value(Value),
    Var(String),
    Fun {
        name: String,
        args: Vec<AstNode>,
        site: Mutex<CallSite>,
    },
    BinOp(BinOp, Box<AstNode>, Box<AstNode>),
    UnaryOp(UnaryOp, Box<AstNode>),
}

impl AstNode {
    pub fn value(v: Value) -> Self {
        AstNode::Value(v)
    }

    pub fn var(name: impl Into<String>) -> Self {
        AstNode::Var(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<AstNode>) -> Self {
        AstNode::Fun {
            name: name.into(),
            args,
            site: Mutex::new(CallSite::default()),
        }
    }

    pub fn bin(op: BinOp, left: AstNode, right: AstNode) -> Self {
        AstNode::BinOp(op, Box::new(left), Box::new(right))
    }

    pub fn unary(op: UnaryOp, right: AstNode) -> Self {
        AstNode::UnaryOp(op, Box::new(right))
    }

    /// Returns the distinct variable names referenced anywhere in the
    /// tree, in first-encountered order (`spec.md` §6: `get_variables`).
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            AstNode::Value(_) => {}
            AstNode::Var(name) => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            AstNode::Fun { args, .. } => {
                for a in args {
                    a.collect_variables(names);
                }
            }
            AstNode::BinOp(_, l, r) => {
                l.collect_variables(names);
                r.collect_variables(names);
            }
            AstNode::UnaryOp(_, r) => r.collect_variables(names),
        }
    }
}
