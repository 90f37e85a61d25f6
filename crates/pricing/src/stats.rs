//! Statistics over an item's quote list.
//!
//! Single-pass closed-form estimators used by the price report:
//! - arithmetic mean and standard even/odd median
//! - population standard deviation (divide by n, not n-1)
//! - a one-sigma band `[mean - std, mean + std]`
//! - the "sanitized" mean, recomputed over prices inside the band only

use serde::Serialize;

use crate::item::PricingStrategy;

/// Derived estimator values for one item's quotes.
///
/// All monetary fields are unit prices except `total_estimated`, which is
/// already multiplied by the target quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStatistics {
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Coefficient of variation, in percent (0 when the mean is 0).
    pub cv: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub sanitized_mean: f64,
    /// `sanitized_mean * quantity`; the report may substitute mean/median
    /// per the item's pricing strategy.
    pub total_estimated: f64,
    /// Quotes inside the one-sigma band.
    pub valid_quotes: usize,
    pub outliers_count: usize,
}

impl PriceStatistics {
    /// All-zero output, used for items with no quotes.
    pub fn zero() -> Self {
        Self {
            min: 0.0,
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            cv: 0.0,
            lower_limit: 0.0,
            upper_limit: 0.0,
            sanitized_mean: 0.0,
            total_estimated: 0.0,
            valid_quotes: 0,
            outliers_count: 0,
        }
    }

    /// The unit price the report uses for a given strategy.
    pub fn unit_estimate(&self, strategy: PricingStrategy) -> f64 {
        match strategy {
            PricingStrategy::Sanitized => self.sanitized_mean,
            PricingStrategy::Mean => self.mean,
            PricingStrategy::Median => self.median,
        }
    }
}

/// Compute estimator values for a list of unit prices and a target quantity.
///
/// Empty input yields all zeros. The outlier band is inclusive on both ends:
/// a price exactly one sigma away from the mean is still valid.
pub fn compute(prices: &[f64], quantity: f64) -> PriceStatistics {
    if prices.is_empty() {
        return PriceStatistics::zero();
    }

    let n = prices.len();
    let mean = mean(prices);
    let std_dev = stddev_population(prices, mean);

    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let median = median_of_sorted(&sorted);

    let cv = if mean == 0.0 { 0.0 } else { std_dev / mean * 100.0 };

    let lower_limit = mean - std_dev;
    let upper_limit = mean + std_dev;

    let in_band: Vec<f64> = prices
        .iter()
        .copied()
        .filter(|p| *p >= lower_limit && *p <= upper_limit)
        .collect();

    let valid_quotes = in_band.len();
    let outliers_count = n - valid_quotes;

    // Degenerate bands (all prices outside) fall back to the raw mean.
    let sanitized_mean = if in_band.is_empty() { mean } else { self::mean(&in_band) };

    PriceStatistics {
        min,
        mean,
        median,
        std_dev,
        cv,
        lower_limit,
        upper_limit,
        sanitized_mean,
        total_estimated: sanitized_mean * quantity,
        valid_quotes,
        outliers_count,
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

/// Population standard deviation (n in the denominator), deterministic.
fn stddev_population(xs: &[f64], mean: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let var = xs
        .iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / (xs.len() as f64);
    var.sqrt()
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
