//! Entity translation between the in-memory model and the two wire schemas.
//!
//! Both codecs share one write policy (collections, indexing, embedded
//! entity rules) and one read policy (meaning lookup, meaning-less probing,
//! multi-value accumulation). They differ only in how a single value is laid
//! out on the wire.

pub mod key;
mod legacy;
mod public;


use crate::{
    context::{AppContext, ContextError},
    entity::{Entity, IndexFlags, Property, PropertyMap, PropertyValue},
    error::ErrorClass,
    key::KeyError,
    value::{Value, ValueType},
};
use nimbus_proto::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

// re-exports
pub use legacy::LegacyCodec;
pub use public::PublicCodec;

/// Deepest embedded-entity nesting a decoder accepts.
pub const MAX_EMBEDDED_DEPTH: usize = 100;

///
/// TranslateError
///

#[derive(Debug, ThisError)]
pub enum TranslateError {
    #[error("property '{property}': {value_type} values cannot be written")]
    UnsupportedDataType {
        property: String,
        value_type: ValueType,
    },

    #[error("property '{property}': embedded entity is force-indexed but cannot be indexed")]
    UnsupportedOperation { property: String },

    #[error("entity has no key")]
    MissingKey,

    #[error("embedded entity in property '{property}' does not decode: {source}")]
    EmbeddedDecode {
        property: String,
        source: prost::DecodeError,
    },

    #[error("property '{property}': embedded entities nest deeper than {limit} levels")]
    NestingTooDeep { property: String, limit: usize },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Decode(#[from] prost::DecodeError),
}

impl TranslateError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedDataType { .. } | Self::UnsupportedOperation { .. } => {
                ErrorClass::Unsupported
            }
            Self::MissingKey | Self::Key(_) => ErrorClass::InvalidInput,
            Self::Context(_) => ErrorClass::Configuration,
            Self::EmbeddedDecode { .. } | Self::NestingTooDeep { .. } | Self::Decode(_) => {
                ErrorClass::Corruption
            }
        }
    }
}

///
/// Protocol
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Legacy,
    Public,
}

///
/// TranslateOptions
///
/// `empty_list_support` off reproduces the historical behavior: an empty
/// collection is written as null and read back as null.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TranslateOptions {
    #[serde(default)]
    pub empty_list_support: bool,
}

///
/// WireCodec
///
/// One wire schema's entity translator.
///

pub trait WireCodec {
    type Entity: Message + Default;

    const PROTOCOL: Protocol;

    fn encode_entity(&self, entity: &Entity) -> Result<Self::Entity, TranslateError>;

    fn decode_entity(&self, wire: &Self::Entity) -> Result<Entity, TranslateError>;

    fn to_bytes(&self, entity: &Entity) -> Result<Vec<u8>, TranslateError> {
        Ok(self.encode_entity(entity)?.encode_to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Entity, TranslateError> {
        let wire = Self::Entity::decode(bytes)?;
        self.decode_entity(&wire)
    }
}

///
/// Translator
///
/// Runtime protocol dispatch over the two codecs.
///

#[derive(Clone, Debug)]
pub struct Translator {
    protocol: Protocol,
    legacy: LegacyCodec,
    public: PublicCodec,
}

impl Translator {
    #[must_use]
    pub fn new(protocol: Protocol, options: TranslateOptions, context: AppContext) -> Self {
        Self {
            protocol,
            legacy: LegacyCodec::new(options),
            public: PublicCodec::new(options, context),
        }
    }

    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn entity_to_bytes(&self, entity: &Entity) -> Result<Vec<u8>, TranslateError> {
        match self.protocol {
            Protocol::Legacy => self.legacy.to_bytes(entity),
            Protocol::Public => self.public.to_bytes(entity),
        }
    }

    pub fn entity_from_bytes(&self, bytes: &[u8]) -> Result<Entity, TranslateError> {
        match self.protocol {
            Protocol::Legacy => self.legacy.from_bytes(bytes),
            Protocol::Public => self.public.from_bytes(bytes),
        }
    }
}

///
/// WRITE POLICY
///

///
/// WireRecord
/// One value to emit, with its resolved indexing.
///

#[derive(Debug)]
pub(crate) struct WireRecord<'a> {
    pub value: &'a Value,
    pub indexed: bool,
    pub multiple: bool,
}

///
/// RecordPlan
///

#[derive(Debug)]
pub(crate) enum RecordPlan<'a> {
    /// Empty collection with empty-list support on.
    EmptyList { indexed: bool },
    /// Empty collection with empty-list support off: a lossy null record.
    EmptyAsNull { indexed: bool },
    Records(Vec<WireRecord<'a>>),
}

/// Resolve what a property writes: the collection policy plus the indexing
/// rules for unindexable types and force-indexed embedded entities.
pub(crate) fn plan_property<'a>(
    name: &str,
    property: &'a Property,
    options: TranslateOptions,
) -> Result<RecordPlan<'a>, TranslateError> {
    let indexed = property.is_indexed();
    let force = property.is_force_indexed();

    let (values, multiple) = match &property.value {
        PropertyValue::Multiple(values) if values.is_empty() => {
            return Ok(if options.empty_list_support {
                RecordPlan::EmptyList { indexed }
            } else {
                RecordPlan::EmptyAsNull { indexed }
            });
        }
        PropertyValue::Multiple(values) => (values.as_slice(), true),
        PropertyValue::Single(value) => (std::slice::from_ref(value), false),
    };

    let mut records = Vec::with_capacity(values.len());
    for value in values {
        let value_type = value.value_type();
        if value_type == ValueType::Raw {
            return Err(TranslateError::UnsupportedDataType {
                property: name.to_string(),
                value_type,
            });
        }

        let record_indexed = match value {
            Value::Entity(embedded) if indexed && force => {
                if !embedded.is_indexable() {
                    return Err(TranslateError::UnsupportedOperation {
                        property: name.to_string(),
                    });
                }
                true
            }
            _ => indexed && value_type.is_indexable(),
        };

        records.push(WireRecord {
            value,
            indexed: record_indexed,
            multiple,
        });
    }

    Ok(RecordPlan::Records(records))
}

///
/// READ POLICY
///

///
/// ReadRecord
/// One decoded wire record, before accumulation.
///

#[derive(Debug)]
pub(crate) enum ReadRecord {
    Value {
        value: Value,
        indexed: bool,
        multiple: bool,
    },
    /// The empty-list sentinel.
    EmptyList { indexed: bool },
}

///
/// PropertyAccumulator
///
/// Folds decoded records into properties. Multi-valued records collect in
/// wire order and a collection is indexed when any of its records is.
/// Indexed embedded entities promote their property to force-indexed.
///

#[derive(Debug)]
pub(crate) struct PropertyAccumulator {
    options: TranslateOptions,
    map: PropertyMap,
}

impl PropertyAccumulator {
    pub const fn new(options: TranslateOptions) -> Self {
        Self {
            options,
            map: PropertyMap::new(),
        }
    }

    pub fn push(&mut self, name: &str, record: ReadRecord) {
        match record {
            ReadRecord::EmptyList { indexed } => {
                let value = if self.options.empty_list_support {
                    PropertyValue::Multiple(Vec::new())
                } else {
                    PropertyValue::Single(Value::Null)
                };
                self.map
                    .insert_unchecked(name.to_string(), Self::wrap(value, indexed, false));
            }
            ReadRecord::Value {
                value,
                indexed,
                multiple,
            } => {
                let force = indexed && matches!(value, Value::Entity(_));

                if multiple {
                    if let Some(existing) = self.map.get_mut(name)
                        && let PropertyValue::Multiple(values) = &mut existing.value
                    {
                        values.push(value);
                        if force {
                            existing.flags = Some(IndexFlags::FORCE_INDEXED);
                        } else if indexed && !existing.is_indexed() {
                            existing.flags = None;
                        }
                        return;
                    }
                    self.map.insert_unchecked(
                        name.to_string(),
                        Self::wrap(PropertyValue::Multiple(vec![value]), indexed, force),
                    );
                } else {
                    self.map.insert_unchecked(
                        name.to_string(),
                        Self::wrap(PropertyValue::Single(value), indexed, force),
                    );
                }
            }
        }
    }

    // Force-indexing outranks the unindexed wrapper.
    fn wrap(value: PropertyValue, indexed: bool, force: bool) -> Property {
        if force {
            Property::with_flags(value, IndexFlags::FORCE_INDEXED)
        } else if indexed {
            Property::bare(value)
        } else {
            Property::unindexed(value)
        }
    }

    pub fn finish(self) -> PropertyMap {
        self.map
    }
}
