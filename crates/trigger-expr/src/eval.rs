//! Compilation entry point and tree-walking evaluator

use std::collections::{BTreeMap, HashMap};

use crate::ast::{BinaryOp, Expr, Expression, UnaryOp};
use crate::error::{CompileError, EvalError};
use crate::parser;
use crate::value::Value;

/// Transform: `subject|name(args)`
pub type TransformFn = fn(&Value, &[Value]) -> Result<Value, String>;

/// Function: `name(args)`
pub type FunctionFn = fn(&[Value]) -> Result<Value, String>;

/// Compiles condition text and evaluates compiled expressions.
///
/// Transform and function names are resolved at compile time, so an
/// expression should be evaluated by the evaluator that compiled it.
#[derive(Clone)]
pub struct Evaluator {
    transforms: HashMap<String, TransformFn>,
    functions: HashMap<String, FunctionFn>,
}

impl Default for Evaluator {
    fn default() -> Self {
        let mut evaluator = Self::empty();
        evaluator
            .add_transform("lower", builtins::lower)
            .add_transform("upper", builtins::upper)
            .add_transform("abs", builtins::abs)
            .add_transform("round", builtins::round)
            .add_transform("floor", builtins::floor)
            .add_transform("ceil", builtins::ceil)
            .add_transform("length", builtins::length)
            .add_transform("number", builtins::number)
            .add_transform("string", builtins::string)
            .add_function("min", builtins::min)
            .add_function("max", builtins::max)
            .add_function("now", builtins::now);
        evaluator
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut transforms: Vec<_> = self.transforms.keys().collect();
        transforms.sort();
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("Evaluator")
            .field("transforms", &transforms)
            .field("functions", &functions)
            .finish()
    }
}

impl Evaluator {
    /// Evaluator with no transforms or functions registered
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    pub fn add_transform(&mut self, name: impl Into<String>, transform: TransformFn) -> &mut Self {
        self.transforms.insert(name.into(), transform);
        self
    }

    pub fn add_function(&mut self, name: impl Into<String>, function: FunctionFn) -> &mut Self {
        self.functions.insert(name.into(), function);
        self
    }

    pub fn has_transform(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn compile(&self, source: &str) -> Result<Expression, CompileError> {
        let ast = parser::parse(source, self)?;
        Ok(Expression::new(source, ast))
    }

    pub fn eval(&self, expression: &Expression, context: &Value) -> Result<Value, EvalError> {
        match expression.ast() {
            Some(ast) => self.eval_expr(ast, &Scope {
                root: context,
                relative: None,
            }),
            None => Ok(Value::Undefined),
        }
    }

    /// Evaluate and coerce the result by truthiness
    pub fn eval_bool(&self, expression: &Expression, context: &Value) -> Result<bool, EvalError> {
        self.eval(expression, context).map(|v| v.truthy())
    }

    fn eval_expr(&self, expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Identifier {
                name,
                from,
                relative,
            } => {
                if let Some(from) = from {
                    let base = self.eval_expr(from, scope)?;
                    return Ok(base.get(name).clone());
                }
                if *relative {
                    return Ok(scope
                        .relative
                        .map(|item| item.get(name).clone())
                        .unwrap_or_default());
                }
                Ok(scope.root.get(name).clone())
            }

            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Negate => match arithmetic_operand(&value) {
                        Some(n) => Ok(Value::Number(-n)),
                        None => Err(EvalError::InvalidOperand {
                            op: "-",
                            operand: value.type_name(),
                        }),
                    },
                }
            }

            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),

            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expr(test, scope)?.truthy() {
                    self.eval_expr(consequent, scope)
                } else {
                    self.eval_expr(alternate, scope)
                }
            }

            Expr::Filter {
                subject,
                predicate,
                relative,
            } => {
                let subject = self.eval_expr(subject, scope)?;
                if subject.is_nullish() {
                    return Ok(Value::Undefined);
                }
                if *relative {
                    self.filter(subject, predicate, scope)
                } else {
                    let index = self.eval_expr(predicate, scope)?;
                    Ok(index_into(&subject, &index))
                }
            }

            Expr::ArrayLiteral(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.eval_expr(item, scope))
                    .collect::<Result<_, _>>()?,
            )),

            Expr::ObjectLiteral(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval_expr(value, scope)?);
                }
                Ok(Value::Object(map))
            }

            Expr::Transform {
                name,
                subject,
                args,
            } => {
                let transform = self
                    .transforms
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownTransform(name.clone()))?;
                let subject = self.eval_expr(subject, scope)?;
                let args = self.eval_args(args, scope)?;
                transform(&subject, &args).map_err(|message| EvalError::CallFailed {
                    name: name.clone(),
                    message,
                })
            }

            Expr::FunctionCall { name, args } => {
                let function = self
                    .functions
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                let args = self.eval_args(args, scope)?;
                function(&args).map_err(|message| EvalError::CallFailed {
                    name: name.clone(),
                    message,
                })
            }
        }
    }

    fn eval_args(&self, args: &[Expr], scope: &Scope<'_>) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|arg| self.eval_expr(arg, scope)).collect()
    }

    fn filter(&self, subject: Value, predicate: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
        let items = match subject {
            Value::Array(items) => items,
            single => vec![single],
        };
        let mut kept = Vec::new();
        for item in items {
            let item_scope = Scope {
                root: scope.root,
                relative: Some(&item),
            };
            if self.eval_expr(predicate, &item_scope)?.truthy() {
                kept.push(item);
            }
        }
        Ok(Value::Array(kept))
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        let lhs = self.eval_expr(left, scope)?;

        // Short-circuit, returning the deciding operand
        match op {
            BinaryOp::And if !lhs.truthy() => return Ok(lhs),
            BinaryOp::Or if lhs.truthy() => return Ok(lhs),
            BinaryOp::And | BinaryOp::Or => return self.eval_expr(right, scope),
            _ => {}
        }

        let rhs = self.eval_expr(right, scope)?;
        let mismatch = || EvalError::TypeMismatch {
            op: op.symbol(),
            left: lhs.type_name(),
            right: rhs.type_name(),
        };

        match op {
            BinaryOp::Eq => Ok(Value::Bool(lhs.loose_eq(&rhs))),
            BinaryOp::Ne => Ok(Value::Bool(!lhs.loose_eq(&rhs))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if lhs.is_nullish() || rhs.is_nullish() {
                    return Ok(Value::Bool(false));
                }
                let ordering = match (&lhs, &rhs) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
                    _ => return Err(mismatch()),
                };
                // NaN compares false against everything
                let Some(ordering) = ordering else {
                    return Ok(Value::Bool(false));
                };
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::In => match &rhs {
                Value::Array(items) => Ok(Value::Bool(items.iter().any(|v| v.loose_eq(&lhs)))),
                Value::String(haystack) => match &lhs {
                    Value::String(needle) => Ok(Value::Bool(haystack.contains(needle.as_str()))),
                    _ => Err(mismatch()),
                },
                Value::Object(map) => match &lhs {
                    Value::String(key) => Ok(Value::Bool(map.contains_key(key))),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", lhs, rhs)))
                }
                _ => match (arithmetic_operand(&lhs), arithmetic_operand(&rhs)) {
                    (Some(a), Some(b)) => Ok(Value::Number(a + b)),
                    _ => Err(mismatch()),
                },
            },
            _ => {
                let (Some(a), Some(b)) = (arithmetic_operand(&lhs), arithmetic_operand(&rhs))
                else {
                    return Err(mismatch());
                };
                let result = match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::FloorDiv => (a / b).floor(),
                    BinaryOp::Mod => a % b,
                    _ => a.powf(b),
                };
                Ok(Value::Number(result))
            }
        }
    }
}

/// Numeric operand for arithmetic. An absent value reads as NaN and `null`
/// as zero, so conditions over missing data evaluate to false.
fn arithmetic_operand(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Undefined => Some(f64::NAN),
        Value::Null => Some(0.0),
        _ => None,
    }
}

struct Scope<'a> {
    root: &'a Value,
    /// Current element while evaluating a filter predicate
    relative: Option<&'a Value>,
}

fn index_into(subject: &Value, index: &Value) -> Value {
    match (subject, index) {
        (Value::Array(items), Value::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => {
            items.get(*n as usize).cloned().unwrap_or_default()
        }
        (Value::Object(_), Value::String(key)) => subject.get(key).clone(),
        _ => Value::Undefined,
    }
}

mod builtins {
    use super::Value;

    fn numeric(name: &str, subject: &Value, f: fn(f64) -> f64) -> Result<Value, String> {
        match subject {
            Value::Number(n) => Ok(Value::Number(f(*n))),
            Value::Undefined | Value::Null => Ok(Value::Undefined),
            other => Err(format!("{} expects a number, got {}", name, other.type_name())),
        }
    }

    pub fn lower(subject: &Value, _: &[Value]) -> Result<Value, String> {
        match subject {
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            Value::Undefined | Value::Null => Ok(Value::Undefined),
            other => Err(format!("expects a string, got {}", other.type_name())),
        }
    }

    pub fn upper(subject: &Value, _: &[Value]) -> Result<Value, String> {
        match subject {
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            Value::Undefined | Value::Null => Ok(Value::Undefined),
            other => Err(format!("expects a string, got {}", other.type_name())),
        }
    }

    pub fn abs(subject: &Value, _: &[Value]) -> Result<Value, String> {
        numeric("abs", subject, f64::abs)
    }

    /// `x|round` or `x|round(digits)`
    pub fn round(subject: &Value, args: &[Value]) -> Result<Value, String> {
        let digits = match args.first() {
            None => 0.0,
            Some(Value::Number(d)) => d.trunc(),
            Some(other) => return Err(format!("digits must be a number, got {}", other.type_name())),
        };
        match subject {
            Value::Number(n) => {
                let scale = 10f64.powf(digits);
                Ok(Value::Number((n * scale).round() / scale))
            }
            _ => numeric("round", subject, f64::round),
        }
    }

    pub fn floor(subject: &Value, _: &[Value]) -> Result<Value, String> {
        numeric("floor", subject, f64::floor)
    }

    pub fn ceil(subject: &Value, _: &[Value]) -> Result<Value, String> {
        numeric("ceil", subject, f64::ceil)
    }

    pub fn length(subject: &Value, _: &[Value]) -> Result<Value, String> {
        match subject {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            Value::Array(items) => Ok(Value::Number(items.len() as f64)),
            Value::Object(map) => Ok(Value::Number(map.len() as f64)),
            Value::Undefined | Value::Null => Ok(Value::Undefined),
            other => Err(format!("{} has no length", other.type_name())),
        }
    }

    pub fn number(subject: &Value, _: &[Value]) -> Result<Value, String> {
        Ok(match subject {
            Value::Number(n) => Value::Number(*n),
            Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        })
    }

    pub fn string(subject: &Value, _: &[Value]) -> Result<Value, String> {
        Ok(Value::String(subject.to_string()))
    }

    fn numbers(name: &str, args: &[Value]) -> Result<Vec<f64>, String> {
        args.iter()
            .map(|arg| match arg {
                Value::Number(n) => Ok(*n),
                other => Err(format!("{} expects numbers, got {}", name, other.type_name())),
            })
            .collect()
    }

    pub fn min(args: &[Value]) -> Result<Value, String> {
        Ok(numbers("min", args)?
            .into_iter()
            .reduce(f64::min)
            .map(Value::Number)
            .unwrap_or_default())
    }

    pub fn max(args: &[Value]) -> Result<Value, String> {
        Ok(numbers("max", args)?
            .into_iter()
            .reduce(f64::max)
            .map(Value::Number)
            .unwrap_or_default())
    }

    /// Wall-clock seconds since the Unix epoch
    pub fn now(_: &[Value]) -> Result<Value, String> {
        Ok(Value::Number(
            chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        ))
    }
}
