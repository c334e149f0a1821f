//! # gatehouse-contracts
//!
//! Shared types, sentinels, and contracts for the Gatehouse workflow engine.
//!
//! Every crate in the workspace imports from here. No engine logic lives in
//! this crate, only data definitions, the normalization used for
//! deduplication, and error types.

pub mod action;
pub mod error;
pub mod event;
pub mod sentinel;
pub mod verify;
pub mod workflow;
