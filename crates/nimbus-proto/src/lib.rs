//! Wire schemas for the datastore service.
//!
//! Two schemas are carried side by side:
//!
//! - [`legacy`]: the internal protocol. Properties are split into an indexed
//!   `property` list and an unindexed `raw_property` list, and values are
//!   disambiguated by an enumerated meaning.
//! - [`public`]: the public protocol. Properties live in a single map keyed
//!   by name; each value carries its own `exclude_from_indexes` flag and an
//!   optional numeric meaning kept for backward compatibility.
//!
//! All messages follow protobuf evolution rules: field numbers are never
//! reused and new fields are optional.
#![allow(clippy::derive_partial_eq_without_eq)]

pub mod legacy;
pub mod meaning;
pub mod public;

pub use prost::{DecodeError, EncodeError, Message};
