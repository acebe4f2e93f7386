//! quotekeeper - quote store and reconciler.
//!
//! This library provides the data side of a quote widget:
//! - Data models (Quote, QuoteId, Conflict)
//! - Durable key-value storage (SQLite)
//! - The quote store (load, save, add, filter, random pick)
//! - JSON export and import
//! - Reconciliation against a remote quote source (diff, resolve)
//! - Sync client and single-flight sync service
//! - Configuration management
//!
//! Rendering and user interaction are left to the embedding application.
//!
//! # Feature Flags
//!
//! - `server`: Include the mock remote quote source (axum).
//! - `desktop`: Default config directory detection.

pub mod config;
pub mod error;
pub mod models;
pub mod preview;
pub mod reconcile;
pub mod storage;
pub mod store;
pub mod sync_client;
#[cfg(feature = "server")]
pub mod sync_server;
pub mod sync_service;
pub mod transfer;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{QuoteError, QuoteResult};
pub use models::{Conflict, Quote, QuoteId, QuoteList};
pub use reconcile::{diff, resolve, Diff, Patch, ResolutionPolicy};
pub use storage::{KeyValueStore, SqliteStore};
pub use store::QuoteStore;
pub use sync_service::{QuoteSync, SyncReport};
