pub mod indicator_metadata;
pub mod macro_series;
pub mod market_price;
pub mod status;
