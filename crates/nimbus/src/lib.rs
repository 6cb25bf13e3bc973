//! nimbus: client library for the cloud datastore.
//!
//! The pure core (keys, values, entities, translation and query
//! preparation) is re-exported from `nimbus-core`. This crate adds the
//! service layer on top: an [`rpc::ApiProxy`] contract supplied by the
//! embedding application, error translation, explicit transaction contexts
//! and TOML configuration.

pub mod config;
pub mod error;
pub mod rpc;
pub mod service;
pub mod transaction;

// re-exports
pub use config::DatastoreConfig;
pub use error::DatastoreError;
pub use nimbus_core::{context, entity, key, query, translate, value};
pub use service::{DatastoreService, QueryResults};
pub use transaction::{Transaction, TransactionContext};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::DatastoreConfig,
        error::DatastoreError,
        rpc::ApiProxy,
        service::DatastoreService,
        transaction::TransactionContext,
    };
    pub use nimbus_core::prelude::*;
}
