//! Test utilities for the Tempora workspace
//!
//! Common fixtures, an engine harness and invariant assertions shared by the integration
//! tests of the other crates.
//!
//! # Features
//!
//! - **Fixtures**: catalog documents of three and four books, with and without namespaces
//! - **Harness**: an in-memory engine with a loaded document and navigation shortcuts
//! - **Environment**: a file-backed engine in a temporary directory
//! - **Assertions**: order-array completeness over every recorded instant

pub mod assertions;
pub mod environment;
pub mod fixtures;
pub mod harness;

pub use assertions::{assert_order_complete, order_violations};
pub use environment::TestEnvironment;
pub use fixtures::{catalog_tree, four_book_catalog, namespaced_catalog, three_book_catalog, Book};
pub use harness::TestEngine;

// Re-export test dependencies for convenience
pub use anyhow::{Context, Result};
pub use tempfile;
pub use tempora_core::logging::init_test_logging;
