use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Recoverable outcomes of the metrics and growth computations.
///
/// None of these terminate a session: the presentation layer renders them as
/// a "not available" state instead of a number.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsError {
    #[error("no data in the selected view")]
    NoData,

    #[error("no previous period to compare against")]
    NoPreviousPeriod,

    #[error("ratio is undefined (division by zero)")]
    UndefinedRatio,
}

/// Data-quality problems detected while building a `Dataset`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("record {index} has an empty competitor name")]
    EmptyCompetitor { index: usize },

    #[error("duplicate record for competitor '{competitor}' on {date}")]
    DuplicateRecord { competitor: String, date: NaiveDate },

    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("line {line}: negative {column} count {value}")]
    NegativeCount {
        line: usize,
        column: &'static str,
        value: i64,
    },

    #[error("line {line}: invalid {column} count '{value}'")]
    InvalidCount {
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// JSON shape for values that may be unavailable.
///
/// `Ok(v)` is written as `{"status": "ok", "value": v}` and `Err(e)` as
/// `{"status": "<reason>"}`, where the reason is the snake_case name of the
/// `MetricsError` variant (`no_data`, `no_previous_period`, `undefined_ratio`).
pub mod availability {
    use serde::ser::{SerializeStruct, Serializer};
    use serde::Serialize;

    use super::MetricsError;

    pub fn serialize<T, S>(value: &Result<T, MetricsError>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Ok(v) => {
                let mut state = serializer.serialize_struct("Available", 2)?;
                state.serialize_field("status", "ok")?;
                state.serialize_field("value", v)?;
                state.end()
            }
            Err(e) => {
                let mut state = serializer.serialize_struct("Unavailable", 1)?;
                state.serialize_field("status", e)?;
                state.end()
            }
        }
    }
}
