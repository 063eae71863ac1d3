//! Public surface for the `sociograph-node` crate.
//!
//! Exposes the router builder, service, and storage types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process node
//! without spawning a subprocess.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod service;
pub mod storage;

pub use config::{ConfigError, NodeConfig};
pub use router::build_router;
pub use service::{PostFeed, ServiceError, SocialGraph};
pub use storage::{memory::MemoryStorage, sqlite::SqliteStorage, Storage, StorageError};
