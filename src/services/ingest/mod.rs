//! Incremental ingestion: plan the missing window, fetch it, normalize the
//! payload and merge it into storage, one symbol at a time.

pub mod collector;
pub mod dataset;
pub mod error;
pub mod fetcher;
pub mod normalizer;
pub mod outcome;
pub mod planner;
pub mod writer;
