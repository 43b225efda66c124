//! Unit tests - Catalog loading, type expressions and engine configuration
//!
//! These tests exercise the public loading surface without assembling a model.

mod catalog_loading_tests;
mod declared_type_tests;
mod engine_config_tests;
