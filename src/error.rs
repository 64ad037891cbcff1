use crate::analysis::error::AnalysisError;
use crate::archive::error::FetchError;
use crate::catalog::error::CatalogError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeatpumpError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
