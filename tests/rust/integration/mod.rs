//! Integration tests - Model assembly, query rewriting and store execution
//!
//! These tests drive the assembler, pipeline and document store together
//! over host catalogs, the way the CLI does.

mod document_store_tests;
mod fixtures;
mod model_assembly_tests;
