use crate::{
    context::AppContext,
    entity::{EmbeddedEntity, Entity, PropertyMap},
    translate::{
        Protocol, PropertyAccumulator, ReadRecord, RecordPlan, TranslateError, TranslateOptions,
        WireCodec, WireRecord, key as key_codec, plan_property,
    },
    value::{
        Blob, BlobKey, Category, Comparable, DateTime, Email, GeoPt, ImHandle, Link, PhoneNumber,
        PostalAddress, Rating, RawValue, ShortBlob, Text, User, Value, ValueType,
    },
};
use nimbus_proto::{
    meaning,
    public::{self, value::ValueType as Wire},
};
use std::collections::BTreeMap;
use tracing::{trace, warn};

///
/// CONSTANTS
///

// Property names of a user value stored as a predefined entity.
const USER_EMAIL: &str = "email";
const USER_AUTH_DOMAIN: &str = "auth_domain";
const USER_ID: &str = "user_id";
const USER_FEDERATED_IDENTITY: &str = "federated_identity";

/// Meaning-less types the public schema can still tell apart by shape,
/// probed after `ValueType::MEANINGLESS_PROBE_ORDER`.
const STRUCTURAL_PROBE_ORDER: [ValueType; 5] = [
    ValueType::DateTime,
    ValueType::ShortBlob,
    ValueType::GeoPt,
    ValueType::Entity,
    ValueType::Null,
];

///
/// PublicCodec
///
/// One value per property name; collections are array values and
/// indexing is the per-value `exclude_from_indexes` flag. Meanings are only
/// written where the value shape alone is ambiguous.
///

#[derive(Clone, Debug, Default)]
pub struct PublicCodec {
    options: TranslateOptions,
    context: AppContext,
}

impl PublicCodec {
    #[must_use]
    pub const fn new(options: TranslateOptions, context: AppContext) -> Self {
        Self { options, context }
    }

    #[must_use]
    pub const fn context(&self) -> &AppContext {
        &self.context
    }

    fn encode_properties(
        &self,
        properties: &PropertyMap,
    ) -> Result<BTreeMap<String, public::Value>, TranslateError> {
        let mut out = BTreeMap::new();

        for (name, property) in properties.iter() {
            let encoded = match plan_property(name, property, self.options)? {
                RecordPlan::EmptyList { .. } => array(Vec::new()),
                RecordPlan::EmptyAsNull { indexed } => public::Value {
                    meaning: meaning::NO_MEANING,
                    exclude_from_indexes: !indexed,
                    value_type: Some(Wire::NullValue(0)),
                },
                RecordPlan::Records(records) => {
                    let multiple = records.first().is_some_and(|r| r.multiple);
                    let mut values = records
                        .iter()
                        .map(|record| self.encode_record(name, record))
                        .collect::<Result<Vec<_>, _>>()?;

                    if multiple {
                        array(values)
                    } else {
                        values.pop().unwrap_or_default()
                    }
                }
            };
            out.insert(name.to_string(), encoded);
        }

        Ok(out)
    }

    pub(crate) fn encode_record(
        &self,
        name: &str,
        record: &WireRecord<'_>,
    ) -> Result<public::Value, TranslateError> {
        let (meaning, value_type) = self.encode_value(name, record.value)?;
        trace!(property = name, meaning, indexed = record.indexed, "public record");

        Ok(public::Value {
            meaning,
            exclude_from_indexes: !record.indexed,
            value_type: Some(value_type),
        })
    }

    fn encode_value(&self, name: &str, value: &Value) -> Result<(i32, Wire), TranslateError> {
        let encoded = match value {
            Value::Null => (meaning::NO_MEANING, Wire::NullValue(0)),
            Value::Int(v) => (meaning::NO_MEANING, Wire::IntegerValue(*v)),
            Value::Double(v) => (meaning::NO_MEANING, Wire::DoubleValue(*v)),
            Value::Bool(v) => (meaning::NO_MEANING, Wire::BooleanValue(*v)),
            Value::String(v) => (meaning::NO_MEANING, Wire::StringValue(v.clone())),
            Value::Text(v) => (meaning::TEXT, Wire::StringValue(v.as_str().to_string())),
            Value::ShortBlob(v) => (meaning::NO_MEANING, Wire::BlobValue(v.as_bytes().to_vec())),
            Value::Blob(v) => (meaning::BLOB, Wire::BlobValue(v.as_bytes().to_vec())),
            Value::DateTime(v) if v.is_rfc3339_representable() => {
                let (seconds, nanos) = v.to_seconds_nanos();
                (
                    meaning::NO_MEANING,
                    Wire::TimestampValue(public::Timestamp { seconds, nanos }),
                )
            }
            Value::DateTime(v) => (meaning::GD_WHEN, Wire::IntegerValue(v.micros())),
            Value::GeoPt(v) => (
                meaning::NO_MEANING,
                Wire::GeoPointValue(public::LatLng {
                    latitude: v.latitude(),
                    longitude: v.longitude(),
                }),
            ),
            Value::User(v) => (meaning::PREDEFINED_ENTITY_USER, Wire::EntityValue(user_to_wire(v))),
            Value::Key(v) => (
                meaning::NO_MEANING,
                Wire::KeyValue(key_codec::key_to_public(v, &self.context)?),
            ),
            Value::Entity(v) => (meaning::NO_MEANING, Wire::EntityValue(self.encode_embedded(v)?)),
            Value::Link(v) => (meaning::ATOM_LINK, Wire::StringValue(v.as_str().to_string())),
            Value::Category(v) => (meaning::ATOM_CATEGORY, Wire::StringValue(v.as_str().to_string())),
            Value::Email(v) => (meaning::GD_EMAIL, Wire::StringValue(v.as_str().to_string())),
            Value::PostalAddress(v) => (
                meaning::GD_POSTALADDRESS,
                Wire::StringValue(v.as_str().to_string()),
            ),
            Value::PhoneNumber(v) => (
                meaning::GD_PHONENUMBER,
                Wire::StringValue(v.as_str().to_string()),
            ),
            Value::BlobKey(v) => (meaning::BLOBKEY, Wire::StringValue(v.as_str().to_string())),
            Value::ImHandle(v) => (meaning::GD_IM, Wire::StringValue(v.to_wire())),
            Value::Rating(v) => (meaning::GD_RATING, Wire::IntegerValue(v.get())),
            Value::Raw(_) => {
                return Err(TranslateError::UnsupportedDataType {
                    property: name.to_string(),
                    value_type: ValueType::Raw,
                });
            }
        };

        Ok(encoded)
    }

    fn encode_embedded(&self, embedded: &EmbeddedEntity) -> Result<public::Entity, TranslateError> {
        let key = embedded
            .key()
            .map(|key| key_codec::key_to_public(key, &self.context))
            .transpose()?;

        Ok(public::Entity {
            key,
            properties: self.encode_properties(embedded.properties())?,
        })
    }

    fn decode_properties(
        &self,
        properties: &BTreeMap<String, public::Value>,
    ) -> Result<PropertyMap, TranslateError> {
        let mut acc = PropertyAccumulator::new(self.options);

        for (name, value) in properties {
            match &value.value_type {
                Some(Wire::ArrayValue(array)) if array.values.is_empty() => {
                    acc.push(name, ReadRecord::EmptyList { indexed: true });
                }
                Some(Wire::ArrayValue(array)) => {
                    for element in &array.values {
                        let decoded = self.decode_value(name, element)?;
                        acc.push(
                            name,
                            ReadRecord::Value {
                                value: decoded,
                                indexed: !element.exclude_from_indexes,
                                multiple: true,
                            },
                        );
                    }
                }
                _ if value.meaning == meaning::EMPTY_LIST => {
                    acc.push(
                        name,
                        ReadRecord::EmptyList {
                            indexed: !value.exclude_from_indexes,
                        },
                    );
                }
                _ => {
                    let decoded = self.decode_value(name, value)?;
                    acc.push(
                        name,
                        ReadRecord::Value {
                            value: decoded,
                            indexed: !value.exclude_from_indexes,
                            multiple: false,
                        },
                    );
                }
            }
        }

        Ok(acc.finish())
    }

    fn decode_value(&self, name: &str, value: &public::Value) -> Result<Value, TranslateError> {
        let meaning = value.meaning;
        let registered = if meaning == meaning::PREDEFINED_ENTITY_USER {
            Some(ValueType::User)
        } else if meaning::is_known(meaning) {
            ValueType::for_meaning(meaning)
        } else {
            None
        };

        let value_type = match registered {
            Some(ty) if has_value(ty, value) => ty,
            Some(ty) => {
                warn!(property = name, meaning, expected = %ty, "public value shape does not match its meaning; reading as null");
                return Ok(Value::Null);
            }
            None => match ValueType::MEANINGLESS_PROBE_ORDER
                .into_iter()
                .chain(STRUCTURAL_PROBE_ORDER)
                .find(|ty| has_value(*ty, value))
            {
                Some(ty) => ty,
                None => {
                    warn!(property = name, meaning, "public value has no recognizable shape; reading as null");
                    return Ok(Value::Null);
                }
            },
        };

        match self.read_as(value_type, value)? {
            Some(decoded) => Ok(decoded),
            None => {
                warn!(property = name, value_type = %value_type, "public value failed conversion; reading as null");
                Ok(Value::Null)
            }
        }
    }

    fn read_as(
        &self,
        value_type: ValueType,
        value: &public::Value,
    ) -> Result<Option<Value>, TranslateError> {
        let wire = value.value_type.as_ref();
        let text = || match wire {
            Some(Wire::StringValue(s)) => Some(s.clone()),
            _ => None,
        };
        let blob = || match wire {
            Some(Wire::BlobValue(b)) => Some(b.clone()),
            _ => None,
        };
        let integer = || match wire {
            Some(Wire::IntegerValue(v)) => Some(*v),
            _ => None,
        };

        let decoded = match value_type {
            ValueType::Null => Some(Value::Null),
            ValueType::Int => integer().map(Value::Int),
            ValueType::Double => match wire {
                Some(Wire::DoubleValue(v)) => Some(Value::Double(*v)),
                _ => None,
            },
            ValueType::Bool => match wire {
                Some(Wire::BooleanValue(v)) => Some(Value::Bool(*v)),
                _ => None,
            },
            ValueType::String => text().map(Value::String),
            ValueType::Text => text().map(|s| Value::Text(Text::new(s))),
            ValueType::ShortBlob => blob().map(|b| Value::ShortBlob(ShortBlob::new(b))),
            ValueType::Blob => blob().map(|b| Value::Blob(Blob::new(b))),
            ValueType::DateTime => match wire {
                Some(Wire::TimestampValue(ts)) => {
                    DateTime::from_seconds_nanos(ts.seconds, ts.nanos).map(Value::DateTime)
                }
                Some(Wire::IntegerValue(v)) => Some(Value::DateTime(DateTime::from_micros(*v))),
                _ => None,
            },
            ValueType::GeoPt => match wire {
                Some(Wire::GeoPointValue(p)) => {
                    GeoPt::new(p.latitude, p.longitude).ok().map(Value::GeoPt)
                }
                _ => None,
            },
            ValueType::User => match wire {
                Some(Wire::EntityValue(entity)) => user_from_wire(entity).map(Value::User),
                _ => None,
            },
            ValueType::Key => match wire {
                Some(Wire::KeyValue(key)) => {
                    Some(Value::Key(key_codec::public_to_key(key, &self.context)?))
                }
                _ => None,
            },
            ValueType::Entity => match wire {
                Some(Wire::EntityValue(entity)) => Some(Value::Entity(self.decode_embedded(entity)?)),
                _ => None,
            },
            ValueType::Link => text().map(|s| Value::Link(Link::new(s))),
            ValueType::Category => text().map(|s| Value::Category(Category::new(s))),
            ValueType::Email => text().map(|s| Value::Email(Email::new(s))),
            ValueType::PostalAddress => text().map(|s| Value::PostalAddress(PostalAddress::new(s))),
            ValueType::PhoneNumber => text().map(|s| Value::PhoneNumber(PhoneNumber::new(s))),
            ValueType::BlobKey => text().map(|s| Value::BlobKey(BlobKey::new(s))),
            ValueType::ImHandle => text().and_then(|s| ImHandle::parse(&s)).map(Value::ImHandle),
            ValueType::Rating => integer()
                .and_then(|v| Rating::new(v).ok())
                .map(Value::Rating),
            ValueType::Raw => self.raw_scalar(wire)?.map(|c| Value::Raw(RawValue::new(c))),
        };

        Ok(decoded)
    }

    fn raw_scalar(&self, wire: Option<&Wire>) -> Result<Option<Comparable>, TranslateError> {
        let scalar = match wire {
            None | Some(Wire::NullValue(_)) => Comparable::Null,
            Some(Wire::IntegerValue(v)) => Comparable::Int(*v),
            Some(Wire::BooleanValue(v)) => Comparable::Bool(*v),
            Some(Wire::StringValue(s)) => Comparable::bytes(s.as_bytes()),
            Some(Wire::BlobValue(b)) => Comparable::bytes(b.clone()),
            Some(Wire::DoubleValue(v)) => Comparable::Double(*v),
            Some(Wire::TimestampValue(ts)) => match DateTime::from_seconds_nanos(ts.seconds, ts.nanos) {
                Some(dt) => Comparable::Int(dt.micros()),
                None => return Ok(None),
            },
            Some(Wire::GeoPointValue(p)) => match GeoPt::new(p.latitude, p.longitude) {
                Ok(point) => Comparable::GeoPt(point),
                Err(_) => return Ok(None),
            },
            Some(Wire::KeyValue(key)) => Comparable::Key(key_codec::public_to_key(key, &self.context)?),
            Some(Wire::EntityValue(entity)) => match user_from_wire(entity) {
                Some(user) => Comparable::User(user),
                None => return Ok(None),
            },
            Some(Wire::ArrayValue(_)) => return Ok(None),
        };

        Ok(Some(scalar))
    }

    fn decode_embedded(&self, wire: &public::Entity) -> Result<EmbeddedEntity, TranslateError> {
        let key = wire
            .key
            .as_ref()
            .map(|key| key_codec::public_to_key(key, &self.context))
            .transpose()?;

        Ok(EmbeddedEntity::from_parts(
            key,
            self.decode_properties(&wire.properties)?,
        ))
    }
}

impl WireCodec for PublicCodec {
    type Entity = public::Entity;

    const PROTOCOL: Protocol = Protocol::Public;

    fn encode_entity(&self, entity: &Entity) -> Result<public::Entity, TranslateError> {
        Ok(public::Entity {
            key: Some(key_codec::key_to_public(entity.key(), &self.context)?),
            properties: self.encode_properties(entity.properties())?,
        })
    }

    fn decode_entity(&self, wire: &public::Entity) -> Result<Entity, TranslateError> {
        let key = wire.key.as_ref().ok_or(TranslateError::MissingKey)?;
        let key = key_codec::public_to_key(key, &self.context)?;

        Ok(Entity::from_parts(key, self.decode_properties(&wire.properties)?))
    }
}

///
/// HELPERS
///

fn array(values: Vec<public::Value>) -> public::Value {
    public::Value {
        meaning: meaning::NO_MEANING,
        exclude_from_indexes: false,
        value_type: Some(Wire::ArrayValue(public::ArrayValue { values })),
    }
}

fn string_value(s: &str) -> public::Value {
    public::Value {
        meaning: meaning::NO_MEANING,
        exclude_from_indexes: false,
        value_type: Some(Wire::StringValue(s.to_string())),
    }
}

/// Structural shape check for a type's public payload.
pub(crate) const fn has_value(value_type: ValueType, value: &public::Value) -> bool {
    let wire = value.value_type.as_ref();

    match value_type {
        ValueType::Null => matches!(wire, None | Some(Wire::NullValue(_))),
        ValueType::Int | ValueType::Rating => matches!(wire, Some(Wire::IntegerValue(_))),
        ValueType::DateTime => {
            matches!(wire, Some(Wire::TimestampValue(_) | Wire::IntegerValue(_)))
        }
        ValueType::Double => matches!(wire, Some(Wire::DoubleValue(_))),
        ValueType::Bool => matches!(wire, Some(Wire::BooleanValue(_))),
        ValueType::GeoPt => matches!(wire, Some(Wire::GeoPointValue(_))),
        ValueType::Key => matches!(wire, Some(Wire::KeyValue(_))),
        ValueType::User => {
            value.meaning == meaning::PREDEFINED_ENTITY_USER
                && matches!(wire, Some(Wire::EntityValue(_)))
        }
        ValueType::Entity => matches!(wire, Some(Wire::EntityValue(_))),
        ValueType::ShortBlob | ValueType::Blob => matches!(wire, Some(Wire::BlobValue(_))),
        ValueType::String
        | ValueType::Text
        | ValueType::Link
        | ValueType::Category
        | ValueType::Email
        | ValueType::PostalAddress
        | ValueType::PhoneNumber
        | ValueType::ImHandle
        | ValueType::BlobKey => matches!(wire, Some(Wire::StringValue(_))),
        ValueType::Raw => !matches!(wire, None | Some(Wire::NullValue(_) | Wire::ArrayValue(_))),
    }
}

fn user_to_wire(user: &User) -> public::Entity {
    let mut properties = BTreeMap::new();
    properties.insert(USER_EMAIL.to_string(), string_value(&user.email));
    properties.insert(USER_AUTH_DOMAIN.to_string(), string_value(&user.auth_domain));
    if let Some(id) = &user.user_id {
        properties.insert(USER_ID.to_string(), string_value(id));
    }
    if let Some(identity) = &user.federated_identity {
        properties.insert(USER_FEDERATED_IDENTITY.to_string(), string_value(identity));
    }

    public::Entity {
        key: None,
        properties,
    }
}

fn user_from_wire(entity: &public::Entity) -> Option<User> {
    let get = |name: &str| match entity.properties.get(name).and_then(|v| v.value_type.as_ref()) {
        Some(Wire::StringValue(s)) => Some(s.clone()),
        _ => None,
    };

    Some(User {
        email: get(USER_EMAIL)?,
        auth_domain: get(USER_AUTH_DOMAIN)?,
        user_id: get(USER_ID),
        federated_identity: get(USER_FEDERATED_IDENTITY),
    })
}
