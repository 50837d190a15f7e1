//! Market valuation collaborator used by revaluation.

pub mod error;
pub mod table;

use chrono::NaiveDate;
use tallyline_shared::types::{Amount, AmountOverflow, Balance, Commodity};

pub use error::ValuationError;
pub use table::{PricePoint, PriceTable};

/// Looks up the market price of a commodity.
pub trait PriceSource {
    /// Price of one unit of `commodity` on `date`: the most recent price
    /// on or before that day. `None` means the commodity is valued as
    /// itself.
    fn price(&self, commodity: &Commodity, date: NaiveDate) -> Option<Amount>;
}

/// A source without prices; every commodity is valued as itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrices;

impl PriceSource for NoPrices {
    fn price(&self, _commodity: &Commodity, _date: NaiveDate) -> Option<Amount> {
        None
    }
}

/// Market value of `balance` on `date`.
///
/// Components with a price are converted into the price's commodity;
/// the rest are kept as they are.
///
/// # Errors
///
/// Returns `AmountOverflow` if a converted quantity or the valued sum
/// leaves the decimal range.
pub fn value_balance(
    balance: &Balance,
    date: NaiveDate,
    prices: &dyn PriceSource,
) -> Result<Balance, AmountOverflow> {
    let mut valued = Balance::new();
    for amount in balance.amounts() {
        let converted = match prices.price(&amount.commodity, date) {
            Some(price) => {
                let quantity = amount
                    .quantity
                    .checked_mul(price.quantity)
                    .ok_or_else(|| AmountOverflow {
                        commodity: price.commodity.clone(),
                    })?;
                Amount::new(quantity, price.commodity)
            }
            None => amount,
        };
        valued.add_amount(&converted)?;
    }
    Ok(valued)
}
