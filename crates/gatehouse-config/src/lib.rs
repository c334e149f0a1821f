//! # gatehouse-config
//!
//! TOML configuration for Gatehouse hosts.
//!
//! ## Configuration format
//!
//! ```toml
//! [engine]
//! max_chain_iterations = 3
//! approval_question = "Approve these directory changes?"
//!
//! [store]
//! backend = "file"
//! directory = "/var/lib/gatehouse/checkpoints"
//! ```

pub mod config;
pub mod schema;

pub use config::GatehouseConfig;
pub use schema::{EngineSection, StoreBackend, StoreSection, DEFAULT_CHECKPOINT_DIR};
