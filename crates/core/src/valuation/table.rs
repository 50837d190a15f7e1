//! In-memory price history.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tallyline_shared::types::{Amount, Commodity};

use super::error::ValuationError;
use super::PriceSource;

/// One recorded price: `1 commodity = price target` from `date` on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricePoint {
    /// The commodity being priced.
    pub commodity: Commodity,
    /// Date the price takes effect.
    pub date: NaiveDate,
    /// Price of one unit, in the table's target commodity.
    pub price: Decimal,
}

/// Price history for a set of commodities, quoted in one target commodity.
#[derive(Debug, Clone)]
pub struct PriceTable {
    target: Commodity,
    history: HashMap<Commodity, BTreeMap<NaiveDate, Decimal>>,
}

impl PriceTable {
    /// Creates an empty table quoting prices in `target`.
    #[must_use]
    pub fn new(target: impl Into<Commodity>) -> Self {
        Self {
            target: target.into(),
            history: HashMap::new(),
        }
    }

    /// Records a price. A later insert for the same day replaces the earlier one.
    pub fn insert(&mut self, commodity: impl Into<Commodity>, date: NaiveDate, price: Decimal) {
        self.history
            .entry(commodity.into())
            .or_default()
            .insert(date, price);
    }

    /// Builder form of [`PriceTable::insert`].
    #[must_use]
    pub fn with_price(mut self, commodity: impl Into<Commodity>, date: NaiveDate, price: Decimal) -> Self {
        self.insert(commodity, date, price);
        self
    }

    /// Parses a JSON array of price points.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the price point schema.
    pub fn from_json(text: &str, target: impl Into<Commodity>) -> Result<Self, ValuationError> {
        let points: Vec<PricePoint> = serde_json::from_str(text)?;
        let mut table = Self::new(target);
        for point in points {
            table.insert(point.commodity, point.date, point.price);
        }
        Ok(table)
    }

    /// Reads and parses a JSON price file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>, target: impl Into<Commodity>) -> Result<Self, ValuationError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text, target)
    }

    /// The commodity prices are quoted in.
    #[must_use]
    pub const fn target(&self) -> &Commodity {
        &self.target
    }

    /// Number of commodities with at least one price.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true if no prices are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl PriceSource for PriceTable {
    fn price(&self, commodity: &Commodity, date: NaiveDate) -> Option<Amount> {
        if *commodity == self.target {
            return None;
        }
        self.history
            .get(commodity)?
            .range(..=date)
            .next_back()
            .map(|(_, price)| Amount::new(*price, self.target.clone()))
    }
}
