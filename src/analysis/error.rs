use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Proportions are undefined without any days to divide by.
    #[error("Cannot compute proportions of an empty temperature series")]
    EmptySeries,

    #[error("Table bounds are reversed: low {low} is above high {high}")]
    InvalidBounds { low: i32, high: i32 },
}
