//! Analytics distributions → chart-ready label/value series.
//!
//! The adapter decides shape only; whether an empty series renders as a
//! placeholder is up to the view.

#![allow(missing_docs)]

use serde::Serialize;

use crate::backend::wire::RawDistribution;

/// Parallel label/value arrays; `values[i]` belongs to `labels[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl Series {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Largest value, or 0 for an empty series.
    #[must_use]
    pub fn max_value(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all values.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    /// `(label, value)` pairs in series order.
    pub fn points(&self) -> impl Iterator<Item = (&str, u64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Convert a distribution, keeping the backend's key insertion order.
#[must_use]
pub fn to_series(distribution: &RawDistribution) -> Series {
    let (labels, values) = distribution
        .iter()
        .map(|(label, count)| (label.clone(), *count))
        .unzip();
    Series { labels, values }
}

/// Both analytics charts. Populated together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsView {
    pub by_age: Series,
    pub by_type: Series,
}

impl AnalyticsView {
    #[must_use]
    pub fn from_distributions(by_age: &RawDistribution, by_type: &RawDistribution) -> Self {
        Self {
            by_age: to_series(by_age),
            by_type: to_series(by_type),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_age.is_empty() && self.by_type.is_empty()
    }
}
