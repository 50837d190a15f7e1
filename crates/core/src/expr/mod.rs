//! Expression collaborator.
//!
//! Stages consume expressions only through the [`Expr`] and [`Evaluator`]
//! traits: predicates read [`Value::is_truthy`], sort keys compare with
//! [`Value::sort_cmp`], and amount expressions feed the running total.
//! [`BuiltinEvaluator`] supplies a small ledger-style language.

pub mod error;
pub mod parser;
pub mod value;

use std::fmt;

pub use error::ExprError;
pub use parser::CompiledExpr;
pub use value::Value;

use crate::journal::Transaction;

/// A compiled expression evaluated against one transaction at a time.
pub trait Expr {
    /// Evaluates the expression.
    ///
    /// # Errors
    ///
    /// Returns `ExprError` if the expression cannot be applied to the
    /// transaction's values.
    fn eval(&self, xact: &Transaction) -> Result<Value, ExprError>;

    /// The text the expression was compiled from.
    fn source(&self) -> &str;
}

impl fmt::Debug for dyn Expr + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.source()).finish()
    }
}

/// Compiles expression text into evaluable expressions.
pub trait Evaluator {
    /// Compiles `text`.
    ///
    /// # Errors
    ///
    /// Returns `ExprError` for malformed text.
    fn compile(&self, text: &str) -> Result<Box<dyn Expr>, ExprError>;
}

/// The built-in expression language.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluator;

impl Evaluator for BuiltinEvaluator {
    fn compile(&self, text: &str) -> Result<Box<dyn Expr>, ExprError> {
        Ok(Box::new(CompiledExpr::compile(text)?))
    }
}

/// Sort key yielding the transaction's date.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateKey;

impl Expr for DateKey {
    fn eval(&self, xact: &Transaction) -> Result<Value, ExprError> {
        Ok(Value::Date(xact.date()))
    }

    fn source(&self) -> &str {
        "date"
    }
}
