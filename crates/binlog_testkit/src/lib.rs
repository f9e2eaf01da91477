//! # Binlog Testkit
//!
//! Test utilities for the binlog write path.
//!
//! This crate provides:
//! - Schema, batch and harness fixtures
//! - A fault-injecting object store and failing allocators
//! - Property-based test generators using proptest
//! - Concurrent upload stress runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use binlog_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn upload_survives_flaky_store() {
//!     let harness = TestHarness::new(4);
//!     harness.store.fail_writes(3);
//!     // ... upload through harness.io
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
