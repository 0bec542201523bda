use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid series `{series}`: {reason}")]
    InvalidSeries { series: String, reason: String },

    #[error("series `{series}` is missing key accessor `{key}`")]
    MissingKeyAccessor { series: String, key: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown graph index {index} (graph count {count})")]
    UnknownGraph { index: usize, count: usize },

    #[error("projection failed: {0}")]
    Projection(String),
}

impl ChartError {
    pub(crate) fn invalid_series(series: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSeries {
            series: series.to_owned(),
            reason: reason.into(),
        }
    }
}
