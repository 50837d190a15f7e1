//! Values produced by expressions.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tallyline_shared::types::{Amount, Balance};

use super::error::ExprError;

/// The result of evaluating an expression against a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// No value (e.g. a missing entry code).
    Null,
    /// A boolean.
    Bool(bool),
    /// A commodity-less number.
    Number(Decimal),
    /// A single-commodity amount.
    Amount(Amount),
    /// A multi-commodity balance.
    Balance(Balance),
    /// Text.
    Text(String),
    /// A calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Name of the value's type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Amount(_) => "amount",
            Self::Balance(_) => "balance",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
        }
    }

    /// Truthiness used when the value is consumed as a predicate.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => !n.is_zero(),
            Self::Amount(a) => !a.is_zero(),
            Self::Balance(b) => !b.is_zero(),
            Self::Text(s) => !s.is_empty(),
            Self::Date(_) => true,
        }
    }

    /// Converts a numeric value into a balance, for accumulation.
    #[must_use]
    pub fn into_balance(self) -> Option<Balance> {
        match self {
            Self::Number(n) => Some(Balance::from(&Amount::number(n))),
            Self::Amount(a) => Some(Balance::from(&a)),
            Self::Balance(b) => Some(b),
            _ => None,
        }
    }

    /// The scalar quantity of a numeric value; balances qualify only when
    /// they hold at most one commodity.
    fn quantity(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Amount(a) => Some(a.quantity),
            Self::Balance(b) if b.is_zero() => Some(Decimal::ZERO),
            Self::Balance(b) => b.single().map(|a| a.quantity),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) | Self::Amount(_) | Self::Balance(_) => 2,
            Self::Text(_) => 3,
            Self::Date(_) => 4,
        }
    }

    /// Compares two values of compatible types.
    ///
    /// # Errors
    ///
    /// Returns `ExprError::TypeMismatch` when the types cannot be compared.
    pub fn try_compare(&self, other: &Self, op: &'static str) -> Result<Ordering, ExprError> {
        let ordering = match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => match (self.quantity(), other.quantity()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        };
        ordering.ok_or(ExprError::TypeMismatch {
            op,
            left: self.type_name(),
            right: other.type_name(),
        })
    }

    /// Nonzero commodity components of a numeric value.
    fn components(&self) -> Vec<Amount> {
        match self {
            Self::Number(n) if n.is_zero() => Vec::new(),
            Self::Number(n) => vec![Amount::number(*n)],
            Self::Amount(a) if a.is_zero() => Vec::new(),
            Self::Amount(a) => vec![a.clone()],
            Self::Balance(b) => b.amounts().collect(),
            _ => Vec::new(),
        }
    }

    /// A total order over all values, used for sort keys.
    ///
    /// Values of different kinds order by kind. Numeric values with at
    /// most one commodity order by quantity and sort before balances
    /// holding several commodities, which order component-wise by
    /// commodity then quantity.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| {
            if self.rank() != 2 {
                return self.try_compare(other, "sort").unwrap_or(Ordering::Equal);
            }
            let (left, right) = (self.components(), other.components());
            match (left.len() > 1, right.len() > 1) {
                (false, false) => {
                    let scalar = |c: &[Amount]| c.first().map_or(Decimal::ZERO, |a| a.quantity);
                    scalar(&left).cmp(&scalar(&right))
                }
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                (true, true) => left
                    .iter()
                    .map(|a| (&a.commodity, a.quantity))
                    .cmp(right.iter().map(|a| (&a.commodity, a.quantity))),
            }
        })
    }

    /// `self + other`.
    ///
    /// # Errors
    ///
    /// Returns `ExprError::TypeMismatch` for non-numeric operands and
    /// `ExprError::Overflow` when the sum leaves the decimal range.
    pub fn checked_add(self, other: Self) -> Result<Self, ExprError> {
        self.additive(other, "+", false)
    }

    /// `self - other`.
    ///
    /// # Errors
    ///
    /// Returns `ExprError::TypeMismatch` for non-numeric operands.
    pub fn checked_sub(self, other: Self) -> Result<Self, ExprError> {
        self.additive(other, "-", true)
    }

    fn additive(self, other: Self, op: &'static str, negate: bool) -> Result<Self, ExprError> {
        let mismatch = ExprError::TypeMismatch {
            op,
            left: self.type_name(),
            right: other.type_name(),
        };
        let other = if negate {
            other.checked_neg().map_err(|_| mismatch.clone())?
        } else {
            other
        };
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                a.checked_add(b).map(Self::Number).ok_or(ExprError::Overflow { op })
            }
            (Self::Amount(a), Self::Number(n)) | (Self::Number(n), Self::Amount(a)) => a
                .quantity
                .checked_add(n)
                .map(|q| Self::Amount(Amount::new(q, a.commodity)))
                .ok_or(ExprError::Overflow { op }),
            (Self::Amount(a), Self::Amount(b)) if a.commodity == b.commodity => a
                .quantity
                .checked_add(b.quantity)
                .map(|q| Self::Amount(Amount::new(q, a.commodity)))
                .ok_or(ExprError::Overflow { op }),
            (left, right) => match (left.into_balance(), right.into_balance()) {
                (Some(mut a), Some(b)) => {
                    a.add_balance(&b).map_err(|_| ExprError::Overflow { op })?;
                    Ok(Self::Balance(a))
                }
                _ => Err(mismatch),
            },
        }
    }

    /// `self * other`; at least one side must be a plain number.
    ///
    /// # Errors
    ///
    /// Returns `ExprError::TypeMismatch` for unsupported operands and
    /// `ExprError::Overflow` when the product leaves the decimal range.
    pub fn checked_mul(self, other: Self) -> Result<Self, ExprError> {
        let overflow = ExprError::Overflow { op: "*" };
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.checked_mul(b).map(Self::Number).ok_or(overflow),
            (Self::Amount(a), Self::Number(n)) | (Self::Number(n), Self::Amount(a)) => a
                .quantity
                .checked_mul(n)
                .map(|q| Self::Amount(Amount::new(q, a.commodity)))
                .ok_or(overflow),
            (Self::Balance(b), Self::Number(n)) | (Self::Number(n), Self::Balance(b)) => {
                let mut scaled = Balance::new();
                for amount in b.amounts() {
                    let quantity = amount.quantity.checked_mul(n).ok_or_else(|| overflow.clone())?;
                    scaled
                        .add_amount(&Amount::new(quantity, amount.commodity))
                        .map_err(|_| overflow.clone())?;
                }
                Ok(Self::Balance(scaled))
            }
            (left, right) => Err(ExprError::TypeMismatch {
                op: "*",
                left: left.type_name(),
                right: right.type_name(),
            }),
        }
    }

    /// Arithmetic negation.
    ///
    /// # Errors
    ///
    /// Returns `ExprError::TypeMismatch` for non-numeric values.
    pub fn checked_neg(self) -> Result<Self, ExprError> {
        match self {
            Self::Number(n) => Ok(Self::Number(-n)),
            Self::Amount(a) => Ok(Self::Amount(-a)),
            Self::Balance(b) => Ok(Self::Balance(-b)),
            other => Err(ExprError::TypeMismatch {
                op: "-",
                left: other.type_name(),
                right: "nothing",
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Amount(a) => write!(f, "{a}"),
            Self::Balance(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{d}"),
        }
    }
}
