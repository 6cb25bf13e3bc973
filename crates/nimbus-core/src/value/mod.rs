mod compare;
mod raw;
mod tag;
mod types;

#[cfg(test)]
mod tests;

use crate::{entity::EmbeddedEntity, key::Key};
use thiserror::Error as ThisError;

// re-exports
pub use compare::{Comparable, ComparableBytes, as_comparable};
pub use raw::RawValue;
pub use tag::ValueType;
pub use types::{
    Blob, BlobKey, Category, DateTime, Email, GeoPt, ImHandle, Link, MAX_INDEXED_BYTES,
    MAX_TIMESTAMP_MICROS, MIN_TIMESTAMP_MICROS, PhoneNumber, PostalAddress, Rating, ShortBlob,
    Text, User,
};

///
/// DataTypeError
///
/// A value that falls outside what its type accepts.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum DataTypeError {
    #[error("{value_type} value is {len} bytes; indexable values are limited to {max} bytes")]
    TooLong {
        value_type: ValueType,
        len: usize,
        max: usize,
    },

    #[error("rating {0} is outside 0..=100")]
    RatingOutOfRange(i64),

    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),

    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),
}

///
/// Value
///
/// Closed set of property values the datastore can store. Every variant
/// has exactly one `ValueType`, which carries its meaning tag, indexability
/// and wire behavior.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Text(Text),
    ShortBlob(ShortBlob),
    Blob(Blob),
    DateTime(DateTime),
    GeoPt(GeoPt),
    User(User),
    Key(Key),
    Entity(EmbeddedEntity),
    Link(Link),
    Category(Category),
    Email(Email),
    PostalAddress(PostalAddress),
    PhoneNumber(PhoneNumber),
    ImHandle(ImHandle),
    Rating(Rating),
    BlobKey(BlobKey),
    Raw(RawValue),
}

impl Value {
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Int(_) => ValueType::Int,
            Self::Double(_) => ValueType::Double,
            Self::Bool(_) => ValueType::Bool,
            Self::String(_) => ValueType::String,
            Self::Text(_) => ValueType::Text,
            Self::ShortBlob(_) => ValueType::ShortBlob,
            Self::Blob(_) => ValueType::Blob,
            Self::DateTime(_) => ValueType::DateTime,
            Self::GeoPt(_) => ValueType::GeoPt,
            Self::User(_) => ValueType::User,
            Self::Key(_) => ValueType::Key,
            Self::Entity(_) => ValueType::Entity,
            Self::Link(_) => ValueType::Link,
            Self::Category(_) => ValueType::Category,
            Self::Email(_) => ValueType::Email,
            Self::PostalAddress(_) => ValueType::PostalAddress,
            Self::PhoneNumber(_) => ValueType::PhoneNumber,
            Self::ImHandle(_) => ValueType::ImHandle,
            Self::Rating(_) => ValueType::Rating,
            Self::BlobKey(_) => ValueType::BlobKey,
            Self::Raw(_) => ValueType::Raw,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value may be stored in an index.
    ///
    /// Type-level indexability, refined for embedded entities, which are
    /// indexable unless they hold an indexed value of an unindexable type.
    #[must_use]
    pub fn is_indexable(&self) -> bool {
        match self {
            Self::Entity(embedded) => embedded.is_indexable(),
            other => other.value_type().is_indexable(),
        }
    }

    /// Reject values the backend would refuse to store.
    pub fn check_supported(&self) -> Result<(), DataTypeError> {
        let len = match self {
            Self::String(s) => s.len(),
            Self::ShortBlob(b) => b.len(),
            _ => return Ok(()),
        };

        if len > MAX_INDEXED_BYTES {
            return Err(DataTypeError::TooLong {
                value_type: self.value_type(),
                len,
                max: MAX_INDEXED_BYTES,
            });
        }

        Ok(())
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_key(&self) -> Option<&Key> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_entity(&self) -> Option<&EmbeddedEntity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

// Conversions from the natural Rust payload of each variant.
macro_rules! value_from {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    i64 => Int,
    f64 => Double,
    bool => Bool,
    String => String,
    Text => Text,
    ShortBlob => ShortBlob,
    Blob => Blob,
    DateTime => DateTime,
    GeoPt => GeoPt,
    User => User,
    Key => Key,
    EmbeddedEntity => Entity,
    Link => Link,
    Category => Category,
    Email => Email,
    PostalAddress => PostalAddress,
    PhoneNumber => PhoneNumber,
    ImHandle => ImHandle,
    Rating => Rating,
    BlobKey => BlobKey,
    RawValue => Raw,
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
