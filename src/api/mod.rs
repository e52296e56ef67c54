mod health_api;
mod health_db;
mod status;

pub use health_api::health_api;
pub use health_db::health_db;
pub use status::status;
