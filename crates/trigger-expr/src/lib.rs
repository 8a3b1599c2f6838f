//! Expression language for trigger conditions
//!
//! A compile-once, evaluate-many subset of the Jexl grammar:
//! - Literals: numbers, strings, booleans, `null`, `undefined`, arrays, objects
//! - Identifiers with member access (`navigation.speedOverGround.value`)
//! - Arithmetic, comparison, `in`, `&&`/`||`, `!`, ternary `a ? b : c`
//! - Filters (`list[.x > 3]`) and index access (`list[0]`, `obj['key']`)
//! - Transforms (`name|lower`) and function calls (`max(a, b)`)
//!
//! Compiled expressions keep their syntax tree so callers can inspect which
//! identifiers an expression reads.

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use ast::*;
pub use error::*;
pub use eval::*;
pub use value::*;
