use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use smol_str::SmolStr;

use crate::{Target, Value};

/// Identifies a memoised call in the evaluator's result table: the function
/// and its literal arguments. Equal calls share one entry, whichever program
/// they were compiled from.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MemoKey {
    name: SmolStr,
    args: Vec<Literal>,
}

impl MemoKey {
    pub fn new(name: impl Into<SmolStr>, args: Vec<Literal>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The key of a call whose children are all literals.
    pub fn from_call(node: &Node) -> Option<Self> {
        let name = node.name()?;
        let args = node
            .children
            .iter()
            .map(|child| match &child.expr {
                Expr::Literal(literal) => Some(literal.clone()),
                Expr::Call(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self::new(name, args))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for MemoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.iter().join(", "))
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum Literal {
    String(String),
    Integer(i64),
    Null,
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Null => Value::Null,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                write!(f, "'")?;
                for c in s.chars() {
                    match c {
                        '\\' => write!(f, "\\\\")?,
                        '\'' => write!(f, "\\'")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "'")
            }
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Null => write!(f, "null"),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Call(SmolStr),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub expr: Expr,
    pub target: Target,
    pub children: Vec<Node>,
    pub(crate) memo: Option<MemoKey>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr && self.target == other.target && self.children == other.children
    }
}

impl Node {
    pub fn literal(literal: Literal, target: Target) -> Self {
        Self {
            expr: Expr::Literal(literal),
            target,
            children: Vec::new(),
            memo: None,
        }
    }

    pub fn string(s: impl Into<String>, target: Target) -> Self {
        Self::literal(Literal::String(s.into()), target)
    }

    pub fn integer(n: i64, target: Target) -> Self {
        Self::literal(Literal::Integer(n), target)
    }

    pub fn null(target: Target) -> Self {
        Self::literal(Literal::Null, target)
    }

    pub fn call(name: impl Into<SmolStr>, target: Target, children: Vec<Node>) -> Self {
        Self {
            expr: Expr::Call(name.into()),
            target,
            children,
            memo: None,
        }
    }

    /// A call is dynamic; a literal is known at compile time.
    #[inline(always)]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.expr, Expr::Call(_))
    }

    #[inline(always)]
    pub fn is_literal(&self) -> bool {
        !self.is_dynamic()
    }

    pub fn literal_value(&self) -> Option<Value> {
        match &self.expr {
            Expr::Literal(literal) => Some(literal.into()),
            Expr::Call(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.expr {
            Expr::Call(name) => Some(name.as_str()),
            Expr::Literal(_) => None,
        }
    }

    pub fn memo_key(&self) -> Option<&MemoKey> {
        self.memo.as_ref()
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.expr {
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Call(name) => {
                write!(f, "{}(", name)?;
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
