//! Contract with the embedding application's RPC transport.
//!
//! The library never talks to the network itself. Requests are
//! byte-serialized protocol messages handed to an [`ApiProxy`], and the
//! reply bytes come back the same way.

use futures::future::BoxFuture;
use thiserror::Error as ThisError;

///
/// RpcError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RpcError {
    /// The remote service rejected the call with an application error code.
    #[error("{service} call failed with code {code}{}", detail_suffix(.detail.as_deref()))]
    Application {
        service: String,
        code: i32,
        detail: Option<String>,
    },

    #[error("transport failure: {0}")]
    Transport(String),
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

/// Pending reply of an asynchronous call. Dropping it abandons the result;
/// no cancellation reaches the remote service.
pub type RpcFuture = BoxFuture<'static, Result<Vec<u8>, RpcError>>;

///
/// ApiProxy
///

pub trait ApiProxy {
    fn make_sync_call(
        &self,
        service: &str,
        method: &str,
        request: &[u8],
    ) -> Result<Vec<u8>, RpcError>;

    fn make_async_call(&self, service: &str, method: &str, request: Vec<u8>) -> RpcFuture;
}

impl<P: ApiProxy + ?Sized> ApiProxy for &P {
    fn make_sync_call(
        &self,
        service: &str,
        method: &str,
        request: &[u8],
    ) -> Result<Vec<u8>, RpcError> {
        (**self).make_sync_call(service, method, request)
    }

    fn make_async_call(&self, service: &str, method: &str, request: Vec<u8>) -> RpcFuture {
        (**self).make_async_call(service, method, request)
    }
}
