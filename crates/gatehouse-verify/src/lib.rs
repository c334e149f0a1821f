//! # gatehouse-verify
//!
//! Argument verification for Gatehouse operations.
//!
//! This crate provides [`verifier::SchemaArgumentVerifier`], which implements
//! [`gatehouse_core::traits::ArgumentVerifier`]. Arguments proposed for an
//! operation are checked before it is invoked:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate.
//! 2. **Semantic**: `RequiredField`, `AllowedValues`, `ForbiddenPattern` and
//!    `Custom` rules evaluated against the argument object.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use gatehouse_verify::SchemaArgumentVerifier;
//!
//! let mut verifier = SchemaArgumentVerifier::new();
//! verifier.register_rule("positive-size", Box::new(|args: &serde_json::Value| {
//!     match args.get("size").and_then(|v| v.as_i64()) {
//!         Some(n) if n > 0 => None,
//!         _ => Some("size must be a positive integer".to_string()),
//!     }
//! }));
//! ```

pub mod verifier;

pub use verifier::{CustomRuleFn, SchemaArgumentVerifier};
