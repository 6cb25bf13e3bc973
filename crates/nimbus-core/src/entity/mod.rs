mod map;


use crate::{
    key::{KEY_PROPERTY, Key, KeyError},
    value::{DataTypeError, Value, ValueType},
};
use std::borrow::Cow;
use thiserror::Error as ThisError;

// re-exports
pub use map::PropertyMap;

///
/// EntityError
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum EntityError {
    #[error("property name must not be empty")]
    EmptyName,

    #[error("property name '{name}' is reserved")]
    ReservedName { name: String },

    #[error("an unindexed property cannot force-index its embedded entity")]
    UnindexedForceIndexed,

    #[error("collection property '{name}' mixes {first} and {found} values")]
    MixedCollection {
        name: String,
        first: ValueType,
        found: ValueType,
    },

    #[error(transparent)]
    DataType(#[from] DataTypeError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Whether `name` has the reserved `__name__` shape.
#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

///
/// IndexFlags
///
/// Explicit indexing flags of a wrapped property. A bare property (no flags)
/// is indexed. `force_indexed_embedded` overrides the default of never
/// indexing embedded entities.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct IndexFlags {
    indexed: bool,
    force_indexed_embedded: bool,
}

impl IndexFlags {
    pub const UNINDEXED: Self = Self {
        indexed: false,
        force_indexed_embedded: false,
    };

    pub const INDEXED: Self = Self {
        indexed: true,
        force_indexed_embedded: false,
    };

    pub const FORCE_INDEXED: Self = Self {
        indexed: true,
        force_indexed_embedded: true,
    };

    pub const fn new(indexed: bool, force_indexed_embedded: bool) -> Result<Self, EntityError> {
        if !indexed && force_indexed_embedded {
            return Err(EntityError::UnindexedForceIndexed);
        }

        Ok(Self {
            indexed,
            force_indexed_embedded,
        })
    }

    #[must_use]
    pub const fn indexed(self) -> bool {
        self.indexed
    }

    #[must_use]
    pub const fn force_indexed_embedded(self) -> bool {
        self.force_indexed_embedded
    }
}

///
/// PropertyValue
///
/// Either one value or an ordered collection stored as repeated records.
/// Every element of a collection has the same value type. An empty
/// collection is a distinct state from `Single(Value::Null)`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Single(Value),
    Multiple(Vec<Value>),
}

impl PropertyValue {
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        }
    }

    #[must_use]
    pub const fn as_single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    #[must_use]
    pub const fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }
}

macro_rules! single_from {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    Self::Single(value.into())
                }
            }
        )*
    };
}

single_from!(
    Value,
    i32,
    i64,
    f64,
    bool,
    &str,
    String,
    Key,
    EmbeddedEntity,
    crate::value::Text,
    crate::value::ShortBlob,
    crate::value::Blob,
    crate::value::DateTime,
    crate::value::GeoPt,
    crate::value::User,
    crate::value::Link,
    crate::value::Category,
    crate::value::Email,
    crate::value::PostalAddress,
    crate::value::PhoneNumber,
    crate::value::ImHandle,
    crate::value::Rating,
    crate::value::BlobKey,
);

impl From<Vec<Value>> for PropertyValue {
    fn from(values: Vec<Value>) -> Self {
        Self::Multiple(values)
    }
}

///
/// Property
///

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub value: PropertyValue,
    pub flags: Option<IndexFlags>,
}

impl Property {
    #[must_use]
    pub const fn bare(value: PropertyValue) -> Self {
        Self { value, flags: None }
    }

    #[must_use]
    pub const fn unindexed(value: PropertyValue) -> Self {
        Self {
            value,
            flags: Some(IndexFlags::UNINDEXED),
        }
    }

    #[must_use]
    pub const fn with_flags(value: PropertyValue, flags: IndexFlags) -> Self {
        Self {
            value,
            flags: Some(flags),
        }
    }

    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        match self.flags {
            Some(flags) => flags.indexed,
            None => true,
        }
    }

    #[must_use]
    pub const fn is_force_indexed(&self) -> bool {
        match self.flags {
            Some(flags) => flags.force_indexed_embedded,
            None => false,
        }
    }
}

///
/// Entity
///
/// A key plus its named properties.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    key: Key,
    properties: PropertyMap,
}

impl Entity {
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            key,
            properties: PropertyMap::new(),
        }
    }

    #[must_use]
    pub const fn from_parts(key: Key, properties: PropertyMap) -> Self {
        Self { key, properties }
    }

    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.key.kind()
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    #[must_use]
    pub fn into_parts(self) -> (Key, PropertyMap) {
        (self.key, self.properties)
    }

    /// Assign a backend-allocated id to an incomplete key.
    pub fn complete_key(&mut self, id: i64) -> Result<(), KeyError> {
        self.key = self.key.complete_with_id(id)?;
        Ok(())
    }

    /// Set an indexed property.
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EntityError> {
        self.properties.set(name, Property::bare(value.into()))
    }

    pub fn set_unindexed_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EntityError> {
        self.properties.set(name, Property::unindexed(value.into()))
    }

    /// Set an indexed property whose embedded entities are indexed too.
    pub fn set_force_indexed_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EntityError> {
        self.properties
            .set(name, Property::with_flags(value.into(), IndexFlags::FORCE_INDEXED))
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Value of a property, including the implicit `__key__` property.
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<Cow<'_, PropertyValue>> {
        if name == KEY_PROPERTY {
            return Some(Cow::Owned(PropertyValue::Single(Value::Key(
                self.key.clone(),
            ))));
        }

        self.properties.get(name).map(|p| Cow::Borrowed(&p.value))
    }

    /// Whether a property is stored unindexed. The implicit `__key__` is
    /// always indexed.
    #[must_use]
    pub fn is_unindexed(&self, name: &str) -> bool {
        self.properties.get(name).is_some_and(|p| !p.is_indexed())
    }
}

///
/// EmbeddedEntity
///
/// Entity stored as a property value. The key is optional.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbeddedEntity {
    key: Option<Key>,
    properties: PropertyMap,
}

impl EmbeddedEntity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn from_parts(key: Option<Key>, properties: PropertyMap) -> Self {
        Self { key, properties }
    }

    #[must_use]
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EntityError> {
        self.properties.set(name, Property::bare(value.into()))
    }

    pub fn set_unindexed_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EntityError> {
        self.properties.set(name, Property::unindexed(value.into()))
    }

    pub fn set_force_indexed_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), EntityError> {
        self.properties
            .set(name, Property::with_flags(value.into(), IndexFlags::FORCE_INDEXED))
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// An embedded entity can be indexed unless one of its indexed
    /// properties holds a value that cannot, checked recursively.
    #[must_use]
    pub fn is_indexable(&self) -> bool {
        self.properties
            .iter()
            .filter(|(_, property)| property.is_indexed())
            .all(|(_, property)| property.value.values().iter().all(Value::is_indexable))
    }
}

impl From<Entity> for EmbeddedEntity {
    fn from(entity: Entity) -> Self {
        Self {
            key: Some(entity.key),
            properties: entity.properties,
        }
    }
}
