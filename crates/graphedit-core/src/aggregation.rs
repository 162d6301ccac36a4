use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFn {
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregationFn {
    /// Folds the values; `None` for an empty input.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let result = match self {
            AggregationFn::Sum => values.iter().sum(),
            AggregationFn::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            AggregationFn::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationFn::Avg => values.iter().sum::<f64>() / values.len() as f64,
        };
        Some(result)
    }
}

/// Numeric rollup over one attribute of an edge group's members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub attribute: String,
    pub function: AggregationFn,
    /// Above this value the edge group is drawn wide.
    #[serde(default)]
    pub width_threshold: Option<f64>,
    /// Computed by the engine.
    #[serde(default)]
    pub value: Option<f64>,
}

impl Aggregation {
    pub fn new(attribute: impl Into<String>, function: AggregationFn) -> Self {
        Self {
            attribute: attribute.into(),
            function,
            width_threshold: None,
            value: None,
        }
    }

    pub fn exceeds_threshold(&self) -> bool {
        match (self.value, self.width_threshold) {
            (Some(value), Some(threshold)) => value > threshold,
            _ => false,
        }
    }
}
