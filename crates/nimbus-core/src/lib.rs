//! Core of the nimbus datastore client: keys, property values, entities,
//! the two-protocol translation engine and query preparation.
//!
//! Everything here is pure. Nothing performs I/O, holds shared mutable
//! state, or blocks; the RPC layer lives in the `nimbus` facade.

pub mod context;
pub mod entity;
pub mod error;
pub mod key;
pub mod query;
pub mod translate;
pub mod value;

// re-exports
pub use context::{AppContext, AppNamespace};
pub use error::{ErrorClass, ErrorDetail, ErrorOrigin, InternalError};

///
/// Prelude
///
/// Domain vocabulary for building keys, entities and queries.
///

pub mod prelude {
    pub use crate::{
        context::{AppContext, AppNamespace},
        entity::{EmbeddedEntity, Entity, IndexFlags, PropertyValue},
        key::Key,
        query::{Cursor, Filter, GeoRegion, Query, SortOrder},
        translate::Protocol,
        value::{DateTime, GeoPt, Value},
    };
}
