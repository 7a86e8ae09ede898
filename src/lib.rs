//! GeoTrie - a compressed IPv4 radix tree for GeoIP-style range databases.
//!
//! This crate maps IPv4 blocks to opaque payloads (country codes, ASNs,
//! routing targets, ...) and keeps the mapping in its smallest form, so
//! several databases can be merged and dumped as a minimal block list.
//!
//! # Features
//!
//! - **Overlapping inserts**: wider and narrower blocks can be added in any order
//! - **Overwrite policy**: choose per insert whether new payloads replace old ones
//! - **Automatic merging**: adjacent blocks with equal payloads collapse
//! - **Longest-prefix lookup**: O(32) point queries
//! - **Range ingestion**: `low-high` ranges split into minimal CIDR blocks
//!
//! # Quick Start
//!
//! ```
//! use geotrie::{Record, Tree};
//!
//! let mut tree = Tree::new();
//! tree.add("1.0.0.4/30".parse().unwrap(), "A", false);
//! tree.add("1.0.0.8/30".parse().unwrap(), "A", false);
//! tree.add("1.0.0.4/32".parse().unwrap(), "B", true);
//!
//! assert_eq!(
//!     tree.dump(),
//!     ["1.0.0.4/32 (B)", "1.0.0.5/32 (A)", "1.0.0.6/31 (A)", "1.0.0.8/30 (A)"]
//! );
//!
//! // Ranges become minimal block lists
//! for record in Record::from_range(0xC0A8_0002, 0xC0A8_000A, "LAN") {
//!     tree.add_record(record, false);
//! }
//! assert_eq!(tree.lookup(0xC0A8_0005), Some(&"LAN"));
//! ```
//!
//! # Concurrency
//!
//! [`Tree`] has no internal locking. Build it once and share it read-only,
//! or use [`SharedTree`] for a single-writer/multiple-reader lock.

mod error;
mod payload;
mod record;
mod shared;
mod tree;

pub mod cidr;
pub mod config;
pub mod converter;

// Re-export core types
pub use cidr::Cidr;
pub use error::{Error, Result};
pub use payload::{Payload, PLACEHOLDER};
pub use record::{Record, RecordView};
pub use shared::SharedTree;
pub use tree::Tree;

// Re-export configuration types
pub use config::{MergeConfig, OutputFormat, SourceConfig};
