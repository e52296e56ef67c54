//! Copies the canonical tables between the hosted and the local database.

pub mod replicator;
