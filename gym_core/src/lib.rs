#![forbid(unsafe_code)]

//! Core domain model and business logic for the gym tracker.
//!
//! This crate provides:
//! - Domain types (profile, weigh-ins, exercise logs, sessions, programs, goals)
//! - The read-only exercise and program catalog
//! - The domain store with its derived aggregates (muscle ratings, personal records)
//! - On-demand muscle group statistics
//! - Export/import and blob persistence

pub mod types;
pub mod error;
pub mod ids;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod stats;
pub mod transfer;
pub mod store;
pub mod persist;
pub mod tracker;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use ids::{IdSupplier, UuidSupplier};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use stats::calculate_muscle_stats;
pub use transfer::{ExportDocument, ImportMode, PersistedState, EXPORT_VERSION};
pub use store::GymStore;
pub use persist::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use tracker::Tracker;
