use crate::{config::ConfigError, rpc::RpcError};
use nimbus_core::{
    InternalError,
    key::KeyError,
    query::{IllegalQueryType, PrepareError, ValidateError},
    translate::TranslateError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// DatastoreErrorCode
///
/// Application error codes reported by the datastore service.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum DatastoreErrorCode {
    BadRequest = 1,
    ConcurrentTransaction = 2,
    InternalError = 3,
    NeedIndex = 4,
    Timeout = 5,
    PermissionDenied = 6,
    BigtableError = 7,
    CommittedButStillApplying = 8,
    CapabilityDisabled = 9,
    TryAlternateBackend = 10,
    SafeTimeTooOld = 11,
}

impl DatastoreErrorCode {
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        let code = match code {
            1 => Self::BadRequest,
            2 => Self::ConcurrentTransaction,
            3 => Self::InternalError,
            4 => Self::NeedIndex,
            5 => Self::Timeout,
            6 => Self::PermissionDenied,
            7 => Self::BigtableError,
            8 => Self::CommittedButStillApplying,
            9 => Self::CapabilityDisabled,
            10 => Self::TryAlternateBackend,
            11 => Self::SafeTimeTooOld,
            _ => return None,
        };

        Some(code)
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for DatastoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ConcurrentTransaction => "CONCURRENT_TRANSACTION",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NeedIndex => "NEED_INDEX",
            Self::Timeout => "TIMEOUT",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::BigtableError => "BIGTABLE_ERROR",
            Self::CommittedButStillApplying => "COMMITTED_BUT_STILL_APPLYING",
            Self::CapabilityDisabled => "CAPABILITY_DISABLED",
            Self::TryAlternateBackend => "TRY_ALTERNATE_BACKEND",
            Self::SafeTimeTooOld => "SAFE_TIME_TOO_OLD",
        };
        write!(f, "{label}")
    }
}

///
/// DatastoreError
///
/// Everything a service call can fail with. Remote failures are translated
/// from their application code; nothing here is retried.
///

#[derive(Debug, ThisError)]
pub enum DatastoreError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("too much contention on these datastore entities, please try again: {0}")]
    ConcurrentModification(String),

    #[error("no matching index found: {0}")]
    NeedIndex(String),

    #[error("the datastore operation timed out, or the data was temporarily unavailable: {0}")]
    Timeout(String),

    #[error("the write was committed but has not been applied yet: {0}")]
    CommittedButStillApplying(String),

    #[error("the datastore capability is disabled: {0}")]
    CapabilityDisabled(String),

    #[error("internal datastore error ({code}): {detail}")]
    Failure {
        code: DatastoreErrorCode,
        detail: String,
    },

    #[error("unrecognized error code {code} from service '{service}': {detail}")]
    Unrecognized {
        service: String,
        code: i32,
        detail: String,
    },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("no transaction is active")]
    NoActiveTransaction,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", .0.display_with_class())]
    Core(#[from] InternalError),
}

impl DatastoreError {
    #[must_use]
    pub fn from_code(code: DatastoreErrorCode, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_default();

        match code {
            DatastoreErrorCode::BadRequest | DatastoreErrorCode::PermissionDenied => {
                Self::IllegalArgument(detail)
            }
            DatastoreErrorCode::ConcurrentTransaction => Self::ConcurrentModification(detail),
            DatastoreErrorCode::NeedIndex => Self::NeedIndex(detail),
            DatastoreErrorCode::Timeout | DatastoreErrorCode::BigtableError => {
                Self::Timeout(detail)
            }
            DatastoreErrorCode::CommittedButStillApplying => {
                Self::CommittedButStillApplying(detail)
            }
            DatastoreErrorCode::CapabilityDisabled => Self::CapabilityDisabled(detail),
            DatastoreErrorCode::InternalError
            | DatastoreErrorCode::TryAlternateBackend
            | DatastoreErrorCode::SafeTimeTooOld => Self::Failure { code, detail },
        }
    }

    /// Reason tag when the query was rejected before any RPC.
    #[must_use]
    pub fn illegal_query_type(&self) -> Option<IllegalQueryType> {
        match self {
            Self::Core(err) => err.illegal_query_type(),
            _ => None,
        }
    }
}

impl From<RpcError> for DatastoreError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Application {
                service,
                code,
                detail,
            } => match DatastoreErrorCode::from_code(code) {
                Some(code) => Self::from_code(code, detail),
                None => Self::Unrecognized {
                    service,
                    code,
                    detail: detail.unwrap_or_default(),
                },
            },
            RpcError::Transport(message) => Self::Transport(message),
        }
    }
}

// Core module errors all funnel through InternalError.
macro_rules! core_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for DatastoreError {
                fn from(err: $ty) -> Self {
                    Self::Core(InternalError::from(err))
                }
            }
        )*
    };
}

core_error_from!(
    KeyError,
    PrepareError,
    TranslateError,
    ValidateError,
    prost::DecodeError,
);

///
/// TESTS
///
