use crate::value::DataTypeError;
use chrono::{SecondsFormat, TimeZone, Utc};
use derive_more::{Deref, Display, From};
use std::{cmp::Ordering, fmt};

///
/// CONSTANTS
///

/// Longest indexable string or short blob, in bytes.
pub const MAX_INDEXED_BYTES: usize = 1500;

/// Smallest date-time representable as an RFC-3339 timestamp
/// (`0001-01-01T00:00:00Z`), in microseconds since the Unix epoch.
pub const MIN_TIMESTAMP_MICROS: i64 = -62_135_596_800_000_000;

/// Largest date-time representable as an RFC-3339 timestamp
/// (`9999-12-31T23:59:59.999999Z`), in microseconds since the Unix epoch.
pub const MAX_TIMESTAMP_MICROS: i64 = 253_402_300_799_999_999;

// Local helper for the meaning-tagged string newtypes.
macro_rules! tagged_string {
    ( $( $(#[$meta:meta])* $name:ident ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, Deref, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
            pub struct $name(String);

            impl $name {
                #[must_use]
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }

                #[must_use]
                pub fn into_inner(self) -> String {
                    self.0
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

tagged_string! {
    /// Long, unindexable text.
    Text,
    /// URL.
    Link,
    /// Category or tag label.
    Category,
    /// Email address.
    Email,
    /// Human-readable postal address.
    PostalAddress,
    /// Telephone number.
    PhoneNumber,
    /// Reference to a blob-store object.
    BlobKey,
}

///
/// ShortBlob
/// Indexable byte string, limited to `MAX_INDEXED_BYTES`.
///

#[derive(Clone, Debug, Deref, Eq, From, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShortBlob(Vec<u8>);

impl ShortBlob {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

///
/// Blob
/// Unindexable byte string of any length.
///

#[derive(Clone, Debug, Deref, Eq, From, Hash, PartialEq)]
pub struct Blob(Vec<u8>);

impl Blob {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

///
/// DateTime
/// Microseconds since the Unix epoch, UTC.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DateTime(i64);

impl DateTime {
    pub const EPOCH: Self = Self(0);

    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    #[must_use]
    pub const fn micros(self) -> i64 {
        self.0
    }

    /// Whether the value fits the RFC-3339 timestamp range.
    #[must_use]
    pub const fn is_rfc3339_representable(self) -> bool {
        self.0 >= MIN_TIMESTAMP_MICROS && self.0 <= MAX_TIMESTAMP_MICROS
    }

    /// Split into (seconds, nanoseconds) with a non-negative nanosecond part.
    #[must_use]
    pub const fn to_seconds_nanos(self) -> (i64, i32) {
        let seconds = self.0.div_euclid(1_000_000);
        #[allow(clippy::cast_possible_truncation)]
        let nanos = (self.0.rem_euclid(1_000_000) * 1_000) as i32;
        (seconds, nanos)
    }

    /// Rebuild from (seconds, nanoseconds). Sub-microsecond precision is
    /// truncated; `None` on overflow.
    #[must_use]
    pub fn from_seconds_nanos(seconds: i64, nanos: i32) -> Option<Self> {
        seconds
            .checked_mul(1_000_000)
            .and_then(|micros| micros.checked_add(i64::from(nanos) / 1_000))
            .map(Self)
    }

    #[must_use]
    pub fn from_chrono(value: chrono::DateTime<Utc>) -> Self {
        Self(value.timestamp_micros())
    }

    #[must_use]
    pub fn to_chrono(self) -> Option<chrono::DateTime<Utc>> {
        Utc.timestamp_micros(self.0).single()
    }

    /// RFC-3339 rendering; `None` outside the representable range.
    #[must_use]
    pub fn to_rfc3339(self) -> Option<String> {
        if !self.is_rfc3339_representable() {
            return None;
        }
        self.to_chrono()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, DataTypeError> {
        let dt = chrono::DateTime::parse_from_rfc3339(s)
            .map_err(|err| DataTypeError::InvalidDateTime(err.to_string()))?;

        Ok(Self::from_chrono(dt.with_timezone(&Utc)))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(rendered) => f.write_str(&rendered),
            None => write!(f, "{}us", self.0),
        }
    }
}

///
/// GeoPt
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPt {
    latitude: f64,
    longitude: f64,
}

impl GeoPt {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DataTypeError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DataTypeError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DataTypeError::LongitudeOutOfRange(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Total order: latitude first, then longitude.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

///
/// User
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct User {
    pub email: String,
    pub auth_domain: String,
    pub user_id: Option<String>,
    pub federated_identity: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(email: impl Into<String>, auth_domain: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            auth_domain: auth_domain.into(),
            user_id: None,
            federated_identity: None,
        }
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn federated_identity(mut self, identity: impl Into<String>) -> Self {
        self.federated_identity = Some(identity.into());
        self
    }
}

///
/// ImHandle
/// Instant-messaging handle. Stored on the wire as "protocol address".
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ImHandle {
    pub protocol: String,
    pub address: String,
}

impl ImHandle {
    #[must_use]
    pub fn new(protocol: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            address: address.into(),
        }
    }

    /// Parse the "protocol address" wire form.
    #[must_use]
    pub fn parse(wire: &str) -> Option<Self> {
        let (protocol, address) = wire.split_once(' ')?;
        Some(Self::new(protocol, address))
    }

    #[must_use]
    pub fn to_wire(&self) -> String {
        format!("{} {}", self.protocol, self.address)
    }
}

///
/// Rating
/// User-provided rating in `0..=100`.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;

    pub fn new(rating: i64) -> Result<Self, DataTypeError> {
        u8::try_from(rating)
            .ok()
            .filter(|r| i64::from(*r) <= Self::MAX)
            .map(Self)
            .ok_or(DataTypeError::RatingOutOfRange(rating))
    }

    #[must_use]
    pub fn get(self) -> i64 {
        i64::from(self.0)
    }
}
