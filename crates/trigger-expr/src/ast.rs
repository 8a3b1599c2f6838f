//! Syntax tree

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub(crate) fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "in" => BinaryOp::In,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "//" => BinaryOp::FloorDiv,
            "%" => BinaryOp::Mod,
            "^" => BinaryOp::Pow,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
        }
    }

    pub(crate) fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or | BinaryOp::And => 10,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::In => 20,
            BinaryOp::Add | BinaryOp::Sub => 30,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod => 40,
            BinaryOp::Pow => 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// `name`, `from.name`, or `.name` inside a filter predicate
    Identifier {
        name: String,
        from: Option<Box<Expr>>,
        relative: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// `subject[predicate]`; `relative` when the predicate reads `.name`
    /// identifiers and therefore filters rather than indexes
    Filter {
        subject: Box<Expr>,
        predicate: Box<Expr>,
        relative: bool,
    },
    ArrayLiteral(Vec<Expr>),
    ObjectLiteral(Vec<(String, Expr)>),
    Transform {
        name: String,
        subject: Box<Expr>,
        args: Vec<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Node kind name, as used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "Literal",
            Expr::Identifier { .. } => "Identifier",
            Expr::Unary { .. } => "UnaryExpression",
            Expr::Binary { .. } => "BinaryExpression",
            Expr::Conditional { .. } => "ConditionalExpression",
            Expr::Filter { .. } => "FilterExpression",
            Expr::ArrayLiteral(_) => "ArrayLiteral",
            Expr::ObjectLiteral(_) => "ObjectLiteral",
            Expr::Transform { .. } => "Transform",
            Expr::FunctionCall { .. } => "FunctionCall",
        }
    }

    /// True if this expression reads a relative identifier belonging to the
    /// enclosing filter. Predicates of nested filters bind their own.
    pub(crate) fn references_relative(&self) -> bool {
        match self {
            Expr::Literal(_) => false,
            Expr::Identifier { from, relative, .. } => {
                *relative || from.as_ref().is_some_and(|f| f.references_relative())
            }
            Expr::Unary { operand, .. } => operand.references_relative(),
            Expr::Binary { left, right, .. } => {
                left.references_relative() || right.references_relative()
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.references_relative()
                    || consequent.references_relative()
                    || alternate.references_relative()
            }
            Expr::Filter { subject, .. } => subject.references_relative(),
            Expr::ArrayLiteral(items) => items.iter().any(Expr::references_relative),
            Expr::ObjectLiteral(entries) => entries.iter().any(|(_, v)| v.references_relative()),
            Expr::Transform { subject, args, .. } => {
                subject.references_relative() || args.iter().any(Expr::references_relative)
            }
            Expr::FunctionCall { args, .. } => args.iter().any(Expr::references_relative),
        }
    }
}

/// A compiled condition: source text plus its syntax tree.
///
/// Blank source compiles to an expression with no tree. Evaluating it yields
/// `undefined`; callers that need the tree treat it as an invalid handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Option<Expr>,
}

impl Expression {
    pub(crate) fn new(source: impl Into<String>, ast: Option<Expr>) -> Self {
        Self {
            source: source.into(),
            ast,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> Option<&Expr> {
        self.ast.as_ref()
    }
}
