use crate::{
    context::ContextError,
    entity::EntityError,
    key::KeyError,
    query::{IllegalQueryType, PrepareError, ValidateError},
    translate::TranslateError,
    value::DataTypeError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured error with a stable classification.
/// Module errors convert into this type at API boundaries that need one
/// error type (for example the service facade).
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a serialize-origin corruption error.
    pub(crate) fn serialize_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Serialize, message)
    }

    /// Configuration problems need operator intervention and are never retried.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    /// Reason tag of a rejected query.
    #[must_use]
    pub fn illegal_query_type(&self) -> Option<IllegalQueryType> {
        match &self.detail {
            Some(ErrorDetail::Query(err)) => Some(err.query_type()),
            None => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Caller supplied a value or query the service cannot accept.
    InvalidInput,
    /// A type or operation outside the supported set.
    Unsupported,
    /// Missing or inconsistent environment setup.
    Configuration,
    /// Bytes received from the wire do not decode.
    Corruption,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidInput => "invalid_input",
            Self::Unsupported => "unsupported",
            Self::Configuration => "configuration",
            Self::Corruption => "corruption",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Query(ValidateError),
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Context,
    Entity,
    Key,
    Query,
    Serialize,
    Translate,
    Value,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Context => "context",
            Self::Entity => "entity",
            Self::Key => "key",
            Self::Query => "query",
            Self::Serialize => "serialize",
            Self::Translate => "translate",
            Self::Value => "value",
        };
        write!(f, "{label}")
    }
}

impl From<ContextError> for InternalError {
    fn from(err: ContextError) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Context, err.to_string())
    }
}

impl From<KeyError> for InternalError {
    fn from(err: KeyError) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Key, err.to_string())
    }
}

impl From<DataTypeError> for InternalError {
    fn from(err: DataTypeError) -> Self {
        Self::new(ErrorClass::InvalidInput, ErrorOrigin::Value, err.to_string())
    }
}

impl From<EntityError> for InternalError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::DataType(inner) => Self::from(inner),
            EntityError::Key(inner) => Self::from(inner),
            other => Self::new(ErrorClass::InvalidInput, ErrorOrigin::Entity, other.to_string()),
        }
    }
}

impl From<TranslateError> for InternalError {
    fn from(err: TranslateError) -> Self {
        let class = err.class();
        match err {
            TranslateError::Context(inner) => Self::from(inner),
            other => Self::new(class, ErrorOrigin::Translate, other.to_string()),
        }
    }
}

impl From<ValidateError> for InternalError {
    fn from(err: ValidateError) -> Self {
        Self {
            class: ErrorClass::InvalidInput,
            origin: ErrorOrigin::Query,
            message: err.to_string(),
            detail: Some(ErrorDetail::Query(err)),
        }
    }
}

impl From<PrepareError> for InternalError {
    fn from(err: PrepareError) -> Self {
        match err {
            PrepareError::Invalid(inner) => Self::from(inner),
            PrepareError::Translate(inner) => Self::from(inner),
            other => Self::new(ErrorClass::Unsupported, ErrorOrigin::Query, other.to_string()),
        }
    }
}

impl From<prost::DecodeError> for InternalError {
    fn from(err: prost::DecodeError) -> Self {
        Self::serialize_corruption(format!("wire decode failed: {err}"))
    }
}
