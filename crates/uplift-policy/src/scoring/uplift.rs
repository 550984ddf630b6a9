use super::domain::{Economics, OutcomePrediction, UpliftRecord};
use super::error::{InputError, InvalidPrediction};
use tracing::warn;

/// Fraction of rejected rows tolerated before a batch is refused outright.
pub const DEFAULT_MAX_INVALID_FRACTION: f64 = 0.05;

/// Converts prediction pairs into signed uplift estimates and contact economics.
#[derive(Debug, Clone, Copy)]
pub struct UpliftCalculator {
    economics: Economics,
    max_invalid_fraction: f64,
}

/// Accepted records, in input order, plus the rows that were excluded.
#[derive(Debug, Clone, Default)]
pub struct UpliftBatch {
    pub records: Vec<UpliftRecord>,
    pub rejected: Vec<InvalidPrediction>,
}

impl UpliftCalculator {
    pub fn new(economics: Economics) -> Self {
        Self {
            economics,
            max_invalid_fraction: DEFAULT_MAX_INVALID_FRACTION,
        }
    }

    /// `fraction` must lie in `[0, 1]`.
    pub fn with_max_invalid_fraction(mut self, fraction: f64) -> Result<Self, InputError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(InputError::InvalidFraction(fraction));
        }
        self.max_invalid_fraction = fraction;
        Ok(self)
    }

    pub fn economics(&self) -> Economics {
        self.economics
    }

    pub fn record(&self, prediction: OutcomePrediction) -> UpliftRecord {
        let uplift = prediction.y1_hat - prediction.y0_hat;
        UpliftRecord {
            id: prediction.id,
            y1_hat: prediction.y1_hat,
            y0_hat: prediction.y0_hat,
            uplift,
            exp_incremental_revenue: uplift,
            exp_profit_per_contact: self.economics.profit_per_contact(uplift),
        }
    }

    /// Score every prediction pair, excluding rows whose predictions or
    /// derived uplift and profit are not finite.
    ///
    /// `row` on each rejection is the zero-based position in `predictions`.
    pub fn compute<I>(&self, predictions: I) -> Result<UpliftBatch, InputError>
    where
        I: IntoIterator<Item = OutcomePrediction>,
    {
        let mut batch = UpliftBatch::default();
        let mut total = 0usize;

        for (row, prediction) in predictions.into_iter().enumerate() {
            total += 1;
            let record = self.record(prediction);
            if !is_scorable(&record) {
                let rejection = InvalidPrediction {
                    row,
                    id: record.id,
                    y1_hat: record.y1_hat,
                    y0_hat: record.y0_hat,
                };
                warn!(%rejection, "excluding row from scoring");
                batch.rejected.push(rejection);
                continue;
            }
            batch.records.push(record);
        }

        if total > 0 {
            let fraction = batch.rejected.len() as f64 / total as f64;
            if fraction > self.max_invalid_fraction {
                return Err(InputError::TooManyInvalidPredictions {
                    rejected: batch.rejected.len(),
                    total,
                    max_fraction: self.max_invalid_fraction,
                });
            }
        }

        Ok(batch)
    }
}

// Overflow in `y1 - y0` or `margin * uplift` leaves finite inputs with an infinite score.
fn is_scorable(record: &UpliftRecord) -> bool {
    record.y1_hat.is_finite()
        && record.y0_hat.is_finite()
        && record.uplift.is_finite()
        && record.exp_profit_per_contact.is_finite()
}
