//! ModelGraph - convention-based model and query mapping
//!
//! This crate provides:
//! - Model assembly from a declared host type surface
//! - Navigation binding and operation classification
//! - Query AST rewriting through authorizer, expander and sourcer chains
//! - An in-memory document store and write-path handoff

pub mod chain;
pub mod config;
pub mod conventions;
pub mod model_catalog;
pub mod query_pipeline;
pub mod store;
pub mod submit;
