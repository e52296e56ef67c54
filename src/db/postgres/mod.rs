pub mod connection;
pub mod migrations;
pub mod models;
pub mod postgres_service;
pub mod repository;

#[cfg(test)]
pub(crate) mod scratch;
