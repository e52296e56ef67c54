pub mod indicator_metadata_repository;
pub mod macro_series_repository;
pub mod market_price_repository;
pub mod status_repository;

/// Rows bound per UNNEST statement when staging a batch.
pub(crate) const STAGE_CHUNK_SIZE: usize = 500;
