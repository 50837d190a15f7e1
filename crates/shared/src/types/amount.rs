//! Commodity-tagged amounts and multi-commodity balances.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Quantities wrap `rust_decimal::Decimal` for arbitrary precision.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Neg;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A quantity left the range `Decimal` can represent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Amount overflow in {commodity}")]
pub struct AmountOverflow {
    /// Commodity of the overflowing component.
    pub commodity: Commodity,
}

impl AmountOverflow {
    /// Returns a stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "AMOUNT_OVERFLOW"
    }
}

/// A commodity symbol such as `$`, `EUR` or `AAPL`.
///
/// The empty symbol stands for a bare number with no commodity attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commodity(String);

impl Commodity {
    /// Creates a commodity from its symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The commodity-less symbol.
    #[must_use]
    pub const fn none() -> Self {
        Self(String::new())
    }

    /// Returns the symbol text.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.0
    }

    /// Returns true for the commodity-less symbol.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Commodity {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

/// A quantity of a single commodity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// The decimal quantity.
    pub quantity: Decimal,
    /// The commodity the quantity is measured in.
    #[serde(default)]
    pub commodity: Commodity,
}

impl Amount {
    /// Creates a new amount.
    #[must_use]
    pub fn new(quantity: Decimal, commodity: impl Into<Commodity>) -> Self {
        Self {
            quantity,
            commodity: commodity.into(),
        }
    }

    /// Creates a commodity-less amount.
    #[must_use]
    pub fn number(quantity: Decimal) -> Self {
        Self::new(quantity, Commodity::none())
    }

    /// Returns true if the quantity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            quantity: -self.quantity,
            commodity: self.commodity,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.commodity.is_none() {
            write!(f, "{}", self.quantity)
        } else {
            write!(f, "{} {}", self.quantity, self.commodity)
        }
    }
}

/// A sum of amounts in any number of commodities.
///
/// Zero components are dropped, so two balances holding the same
/// non-zero quantities always compare equal. Iteration is ordered by
/// commodity symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(BTreeMap<Commodity, Decimal>);

impl Balance {
    /// Creates an empty (zero) balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single amount into the balance.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the component leaves the decimal range;
    /// the balance is left unchanged.
    pub fn add_amount(&mut self, amount: &Amount) -> Result<(), AmountOverflow> {
        if amount.is_zero() {
            return Ok(());
        }
        let current = self.quantity(&amount.commodity);
        let sum = current
            .checked_add(amount.quantity)
            .ok_or_else(|| AmountOverflow {
                commodity: amount.commodity.clone(),
            })?;
        if sum.is_zero() {
            self.0.remove(&amount.commodity);
        } else {
            self.0.insert(amount.commodity.clone(), sum);
        }
        Ok(())
    }

    /// Adds every component of another balance.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if any component leaves the decimal range.
    pub fn add_balance(&mut self, other: &Self) -> Result<(), AmountOverflow> {
        for amount in other.amounts() {
            self.add_amount(&amount)?;
        }
        Ok(())
    }

    /// `self - other`.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if any component leaves the decimal range.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, AmountOverflow> {
        let mut difference = self.clone();
        difference.add_balance(&-other.clone())?;
        Ok(difference)
    }

    /// Returns true if every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of non-zero commodities held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the balance holds no commodity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Quantity held in one commodity (zero when absent).
    #[must_use]
    pub fn quantity(&self, commodity: &Commodity) -> Decimal {
        self.0.get(commodity).copied().unwrap_or(Decimal::ZERO)
    }

    /// Returns the single amount if exactly one commodity is held.
    #[must_use]
    pub fn single(&self) -> Option<Amount> {
        if self.0.len() == 1 {
            self.amounts().next()
        } else {
            None
        }
    }

    /// Iterates the non-zero components as amounts.
    pub fn amounts(&self) -> impl Iterator<Item = Amount> + '_ {
        self.0
            .iter()
            .map(|(commodity, quantity)| Amount::new(*quantity, commodity.clone()))
    }
}

impl From<&Amount> for Balance {
    fn from(amount: &Amount) -> Self {
        let mut balance = Self::new();
        if !amount.is_zero() {
            balance.0.insert(amount.commodity.clone(), amount.quantity);
        }
        balance
    }
}

impl Neg for Balance {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.into_iter().map(|(c, q)| (c, -q)).collect())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let parts: Vec<String> = self.amounts().map(|a| a.to_string()).collect();
        f.write_str(&parts.join(", "))
    }
}
