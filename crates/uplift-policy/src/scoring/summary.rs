use super::domain::{Economics, RankedRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Financial totals for the chosen contact set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub contacts: usize,
    pub expected_revenue: f64,
    pub expected_cost: f64,
    pub expected_profit: f64,
}

impl Summary {
    pub fn from_selection(records: &[RankedRecord], economics: Economics) -> Self {
        let contacts = records.len();
        let expected_revenue: f64 = records
            .iter()
            .map(|record| record.exp_incremental_revenue)
            .sum();
        let expected_cost = economics.cost() * contacts as f64;
        let expected_profit = economics.margin() * expected_revenue - expected_cost;

        Self {
            contacts,
            expected_revenue,
            expected_cost,
            expected_profit,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Contacts: {}  |  Expected revenue: {}  |  Cost: {}  |  Profit: {}",
            self.contacts,
            grouped(self.expected_revenue),
            grouped(self.expected_cost),
            grouped(self.expected_profit)
        )
    }
}

/// Two decimals with comma thousands separators, e.g. `-12,345.60`.
fn grouped(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut digits = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            digits.push(',');
        }
        digits.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}{digits}.{fraction}")
}
