use crate::value::{
    BlobKey, Category, Comparable, DateTime, Email, ImHandle, Link, PhoneNumber, PostalAddress,
    Rating, ShortBlob, Value, ValueType,
};

///
/// RawValue
///
/// Value read back from an index (projection queries) without the meaning
/// tag of the stored property. Holds the raw index scalar; the caller
/// reinterprets it through `as_type` once the expected type is known.
/// Raw values are read-only and cannot be written back.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RawValue(Comparable);

impl RawValue {
    #[must_use]
    pub const fn new(scalar: Comparable) -> Self {
        Self(scalar)
    }

    #[must_use]
    pub const fn as_comparable(&self) -> &Comparable {
        &self.0
    }

    /// Natural value of the raw scalar: bytes become a `String` when they
    /// are UTF-8 and a `ShortBlob` otherwise.
    #[must_use]
    pub fn value(&self) -> Value {
        match &self.0 {
            Comparable::Null => Value::Null,
            Comparable::Int(v) => Value::Int(*v),
            Comparable::Bool(v) => Value::Bool(*v),
            Comparable::Bytes(bytes) => match std::str::from_utf8(bytes.as_bytes()) {
                Ok(s) => Value::String(s.to_string()),
                Err(_) => Value::ShortBlob(ShortBlob::new(bytes.as_bytes().to_vec())),
            },
            Comparable::Double(v) => Value::Double(*v),
            Comparable::GeoPt(v) => Value::GeoPt(*v),
            Comparable::User(v) => Value::User(v.clone()),
            Comparable::Key(v) => Value::Key(v.clone()),
        }
    }

    /// Reinterpret the raw scalar as `target`. `None` when the scalar's
    /// shape cannot carry that type; a null scalar is `Value::Null` for
    /// every target.
    #[must_use]
    pub fn as_type(&self, target: ValueType) -> Option<Value> {
        if matches!(self.0, Comparable::Null) {
            return Some(Value::Null);
        }

        match (&self.0, target) {
            (Comparable::Int(v), ValueType::Int) => Some(Value::Int(*v)),
            (Comparable::Int(v), ValueType::DateTime) => {
                Some(Value::DateTime(DateTime::from_micros(*v)))
            }
            (Comparable::Int(v), ValueType::Rating) => Rating::new(*v).ok().map(Value::Rating),
            (Comparable::Bool(v), ValueType::Bool) => Some(Value::Bool(*v)),
            (Comparable::Double(v), ValueType::Double) => Some(Value::Double(*v)),
            (Comparable::GeoPt(v), ValueType::GeoPt) => Some(Value::GeoPt(*v)),
            (Comparable::User(v), ValueType::User) => Some(Value::User(v.clone())),
            (Comparable::Key(v), ValueType::Key) => Some(Value::Key(v.clone())),
            (Comparable::Bytes(bytes), ValueType::ShortBlob) => {
                Some(Value::ShortBlob(ShortBlob::new(bytes.as_bytes().to_vec())))
            }
            (Comparable::Bytes(bytes), target) => {
                let s = std::str::from_utf8(bytes.as_bytes()).ok()?.to_string();
                match target {
                    ValueType::String => Some(Value::String(s)),
                    ValueType::Link => Some(Value::Link(Link::new(s))),
                    ValueType::Category => Some(Value::Category(Category::new(s))),
                    ValueType::Email => Some(Value::Email(Email::new(s))),
                    ValueType::PostalAddress => Some(Value::PostalAddress(PostalAddress::new(s))),
                    ValueType::PhoneNumber => Some(Value::PhoneNumber(PhoneNumber::new(s))),
                    ValueType::BlobKey => Some(Value::BlobKey(BlobKey::new(s))),
                    ValueType::ImHandle => ImHandle::parse(&s).map(Value::ImHandle),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
