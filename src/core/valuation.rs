//! Provides functions for valuing asset holdings against market rates.
use crate::core::model::{Asset, AssetKind, Record, RecordId};
use crate::core::rates::RateTable;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// How the current value of a holding was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuationBasis {
    /// Base currency cash, always worth its face value.
    Cash,
    /// Marked to a live market rate.
    Market(Decimal),
    /// No live rate, held at cost.
    Cost,
}

/// Represents the calculated cost, value and profit/loss of a single holding.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetValuation {
    pub id: RecordId,
    pub kind: AssetKind,
    pub cost: Decimal,
    pub current_value: Decimal,
    pub pl: Decimal,
    pub pl_percent: Option<Decimal>,
    pub basis: ValuationBasis,
}

impl AssetValuation {
    pub fn is_rated(&self) -> bool {
        matches!(self.basis, ValuationBasis::Market(_))
    }
}

/// Aggregate figures over a set of holdings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioTotals {
    pub total_cost: Decimal,
    pub total_current_value: Decimal,
    pub total_pl: Decimal,
    /// Profit/loss relative to the cost of holdings that had a live rate.
    pub total_pl_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioValuation {
    pub per_asset: Vec<AssetValuation>,
    pub totals: PortfolioTotals,
}

impl PortfolioValuation {
    pub fn get(&self, id: &RecordId) -> Option<&AssetValuation> {
        self.per_asset.iter().find(|v| &v.id == id)
    }
}

/// Values every holding and sums the results.
///
/// Holdings with a live rate are marked to market; the rest are held at
/// cost and contribute no profit or loss. Malformed holdings (non-positive
/// quantity, negative unit cost, or amounts too large to multiply or add to
/// the totals) are skipped.
pub fn valuate(assets: &[Asset], rates: &RateTable) -> PortfolioValuation {
    let mut valuation = PortfolioValuation::default();
    let mut rated_cost = Decimal::ZERO;

    for asset in assets {
        let Some(value) = value_asset(asset, rates) else {
            continue;
        };

        let totals = &valuation.totals;
        let (pl, cost) = if value.is_rated() {
            (value.pl, value.cost)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        let sums = (
            totals.total_cost.checked_add(value.cost),
            totals.total_current_value.checked_add(value.current_value),
            totals.total_pl.checked_add(pl),
            rated_cost.checked_add(cost),
        );
        let (Some(total_cost), Some(total_current_value), Some(total_pl), Some(rated)) = sums
        else {
            warn!(id = %value.id, "Skipping asset, portfolio total overflows");
            continue;
        };

        valuation.totals.total_cost = total_cost;
        valuation.totals.total_current_value = total_current_value;
        valuation.totals.total_pl = total_pl;
        rated_cost = rated;
        valuation.per_asset.push(value);
    }

    valuation.totals.total_pl_percent = percent_of(valuation.totals.total_pl, rated_cost);
    debug!(
        assets = valuation.per_asset.len(),
        total_value = %valuation.totals.total_current_value,
        "Valued portfolio"
    );
    valuation
}

/// Values a single holding, or `None` if the holding is malformed.
pub fn value_asset(asset: &Asset, rates: &RateTable) -> Option<AssetValuation> {
    if let Err(e) = asset.check() {
        warn!(id = %asset.id, "Skipping malformed asset: {e}");
        return None;
    }

    if asset.kind == AssetKind::CashLocal {
        return Some(AssetValuation {
            id: asset.id.clone(),
            kind: asset.kind,
            cost: asset.quantity,
            current_value: asset.quantity,
            pl: Decimal::ZERO,
            pl_percent: percent_of(Decimal::ZERO, asset.quantity),
            basis: ValuationBasis::Cash,
        });
    }

    let Some(cost) = asset.quantity.checked_mul(asset.unit_cost) else {
        warn!(id = %asset.id, "Skipping asset, cost overflows");
        return None;
    };

    let (current_value, basis) = match rates.live_rate(asset.kind) {
        Some(rate) => {
            let Some(value) = asset.quantity.checked_mul(rate) else {
                warn!(id = %asset.id, "Skipping asset, market value overflows");
                return None;
            };
            (value, ValuationBasis::Market(rate))
        }
        None => {
            debug!(id = %asset.id, kind = %asset.kind, "No live rate, holding at cost");
            (cost, ValuationBasis::Cost)
        }
    };

    let pl = match basis {
        ValuationBasis::Market(_) => current_value - cost,
        _ => Decimal::ZERO,
    };

    Some(AssetValuation {
        id: asset.id.clone(),
        kind: asset.kind,
        cost,
        current_value,
        pl,
        pl_percent: percent_of(pl, cost),
        basis,
    })
}

/// `part / whole * 100`, or `None` when `whole` is not positive.
fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole <= Decimal::ZERO {
        return None;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
}
