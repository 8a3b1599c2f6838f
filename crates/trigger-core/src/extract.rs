//! Static identifier extraction

use trigger_expr::{Expr, Expression};
use trigger_util::TriggerError;

/// Names an expression reads, deduplicated in first-occurrence order.
///
/// Member chains are joined with `.` (`a.b.c`). Relative identifiers inside a
/// filter yield their own name. Object literal keys are not identifiers.
/// Function calls are rejected because their inputs cannot be known
/// statically.
pub fn extract_identifiers(expression: &Expression) -> Result<Vec<String>, TriggerError> {
    let ast = expression
        .ast()
        .ok_or(TriggerError::InvalidExpressionHandle)?;
    let mut names = Vec::new();
    collect(ast, &mut names)?;
    Ok(names)
}

fn collect(expr: &Expr, names: &mut Vec<String>) -> Result<(), TriggerError> {
    match expr {
        Expr::Literal(_) => {}
        Expr::Identifier { .. } => {
            if let Some(name) = qualified_name(expr, names)? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Expr::Unary { operand, .. } => collect(operand, names)?,
        Expr::Binary { left, right, .. } => {
            collect(left, names)?;
            collect(right, names)?;
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect(test, names)?;
            collect(consequent, names)?;
            collect(alternate, names)?;
        }
        Expr::Filter {
            subject, predicate, ..
        } => {
            collect(subject, names)?;
            collect(predicate, names)?;
        }
        Expr::ArrayLiteral(items) => {
            for item in items {
                collect(item, names)?;
            }
        }
        Expr::ObjectLiteral(entries) => {
            for (_, value) in entries {
                collect(value, names)?;
            }
        }
        Expr::Transform { subject, args, .. } => {
            collect(subject, names)?;
            for arg in args {
                collect(arg, names)?;
            }
        }
        other @ Expr::FunctionCall { .. } => {
            return Err(TriggerError::unsupported_node(other.kind()));
        }
    }
    Ok(())
}

/// Dotted name of an identifier chain. When the chain hangs off something
/// other than an identifier (`list[0].x`), that base is collected on its own
/// and the member names are not reported.
fn qualified_name(expr: &Expr, names: &mut Vec<String>) -> Result<Option<String>, TriggerError> {
    match expr {
        Expr::Identifier {
            name, from: None, ..
        } => Ok(Some(name.clone())),
        Expr::Identifier {
            name,
            from: Some(from),
            ..
        } => Ok(qualified_name(from, names)?.map(|parent| format!("{}.{}", parent, name))),
        other => {
            collect(other, names)?;
            Ok(None)
        }
    }
}
