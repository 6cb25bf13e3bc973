use crate::{
    key::Key,
    value::{GeoPt, User, Value},
};
use std::cmp::Ordering;

///
/// ComparableBytes
///
/// Byte string compared as unsigned bytes, lexicographically.
/// This is index order, which differs from `str` order only for
/// non-ASCII content but must match the backend exactly.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ComparableBytes(Vec<u8>);

impl ComparableBytes {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Ord for ComparableBytes {
    fn cmp(&self, other: &Self) -> Ordering {
        // `[u8]` ordering is already unsigned lexicographic.
        self.0.as_slice().cmp(other.0.as_slice())
    }
}

impl PartialOrd for ComparableBytes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

///
/// Comparable
///
/// Totally ordered projection of an indexable value, matching how the
/// backend orders index entries. Variant order is the cross-type rank.
///

#[derive(Clone, Debug)]
pub enum Comparable {
    Null,
    Int(i64),
    Bool(bool),
    Bytes(ComparableBytes),
    Double(f64),
    GeoPt(GeoPt),
    User(User),
    Key(Key),
}

impl Comparable {
    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) => 1,
            Self::Bool(_) => 2,
            Self::Bytes(_) => 3,
            Self::Double(_) => 4,
            Self::GeoPt(_) => 5,
            Self::User(_) => 6,
            Self::Key(_) => 7,
        }
    }

    pub(crate) fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(ComparableBytes::new(bytes.into()))
    }
}

impl Ord for Comparable {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::GeoPt(a), Self::GeoPt(b)) => a.total_cmp(b),
            (Self::User(a), Self::User(b)) => a.cmp(b),
            (Self::Key(a), Self::Key(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Comparable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Comparable {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Comparable {}

/// Comparable projection of a value, or `None` when its type has no
/// indexable form.
#[must_use]
pub fn as_comparable(value: &Value) -> Option<Comparable> {
    let comparable = match value {
        Value::Null => Comparable::Null,
        Value::Int(v) => Comparable::Int(*v),
        Value::DateTime(v) => Comparable::Int(v.micros()),
        Value::Rating(v) => Comparable::Int(v.get()),
        Value::Bool(v) => Comparable::Bool(*v),
        Value::String(v) => Comparable::bytes(v.as_bytes()),
        Value::ShortBlob(v) => Comparable::bytes(v.as_bytes()),
        Value::Link(v) => Comparable::bytes(v.as_str().as_bytes()),
        Value::Category(v) => Comparable::bytes(v.as_str().as_bytes()),
        Value::Email(v) => Comparable::bytes(v.as_str().as_bytes()),
        Value::PostalAddress(v) => Comparable::bytes(v.as_str().as_bytes()),
        Value::PhoneNumber(v) => Comparable::bytes(v.as_str().as_bytes()),
        Value::BlobKey(v) => Comparable::bytes(v.as_str().as_bytes()),
        Value::ImHandle(v) => Comparable::bytes(v.to_wire()),
        Value::Double(v) => Comparable::Double(*v),
        Value::GeoPt(v) => Comparable::GeoPt(*v),
        Value::User(v) => Comparable::User(v.clone()),
        Value::Key(v) => Comparable::Key(v.clone()),
        Value::Raw(raw) => raw.as_comparable().clone(),
        Value::Text(_) | Value::Blob(_) | Value::Entity(_) => return None,
    };

    Some(comparable)
}
