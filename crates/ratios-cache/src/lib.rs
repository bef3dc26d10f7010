#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ratiolab/ratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for fetched statement data.
//!
//! This crate provides implementations of the [`StatementCache`] trait from
//! `ratios-core`:
//!
//! - [`InMemoryCache`] - in-memory cache with a declared time-to-live
//! - [`NoopCache`] - no-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use ratios_core::StatementCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;
