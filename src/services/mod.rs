pub mod ingest;
pub mod loaders;
pub mod status;
pub mod sync;

#[cfg(test)]
pub(crate) mod fakes;
