//! Configuration management for BucketFM.
//!
//! Store selection and operation tuning ([`settings::Config`]) are read from
//! a TOML file at startup.

pub mod settings;

pub use settings::{Config, DeleteConfig, ListingConfig, StoreBackend, StoreConfig};
