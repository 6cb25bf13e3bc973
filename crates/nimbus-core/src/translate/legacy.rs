use crate::{
    entity::{EmbeddedEntity, Entity, PropertyMap},
    translate::{
        MAX_EMBEDDED_DEPTH, Protocol, PropertyAccumulator, ReadRecord, RecordPlan, TranslateError, TranslateOptions,
        WireCodec, WireRecord, key as key_codec, plan_property,
    },
    value::{
        Blob, BlobKey, Category, Comparable, DateTime, Email, GeoPt, ImHandle, Link, PhoneNumber,
        PostalAddress, Rating, RawValue, ShortBlob, Text, User, Value, ValueType,
    },
};
use nimbus_proto::{Message, legacy, meaning};
use tracing::{trace, warn};

///
/// LegacyCodec
///
/// Indexed properties go to `property`, unindexed ones to `raw_property`.
/// Every non-default type is told apart by its meaning tag.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyCodec {
    options: TranslateOptions,
}

impl LegacyCodec {
    #[must_use]
    pub const fn new(options: TranslateOptions) -> Self {
        Self { options }
    }

    fn encode_properties(
        &self,
        properties: &PropertyMap,
    ) -> Result<(Vec<legacy::Property>, Vec<legacy::Property>), TranslateError> {
        let mut indexed = Vec::new();
        let mut raw = Vec::new();

        for (name, property) in properties.iter() {
            match plan_property(name, property, self.options)? {
                RecordPlan::EmptyList { indexed: is_indexed } => {
                    let record = marker_record(name, meaning::EMPTY_LIST);
                    bucket(&mut indexed, &mut raw, is_indexed).push(record);
                }
                RecordPlan::EmptyAsNull { indexed: is_indexed } => {
                    let record = marker_record(name, meaning::NO_MEANING);
                    bucket(&mut indexed, &mut raw, is_indexed).push(record);
                }
                RecordPlan::Records(records) => {
                    for record in records {
                        let is_indexed = record.indexed;
                        let encoded = self.encode_record(name, &record)?;
                        bucket(&mut indexed, &mut raw, is_indexed).push(encoded);
                    }
                }
            }
        }

        Ok((indexed, raw))
    }

    pub(crate) fn encode_record(
        &self,
        name: &str,
        record: &WireRecord<'_>,
    ) -> Result<legacy::Property, TranslateError> {
        let (meaning, value) = self.encode_value(name, record.value)?;
        trace!(property = name, meaning, indexed = record.indexed, "legacy record");

        Ok(legacy::Property {
            meaning: (meaning != meaning::NO_MEANING).then_some(meaning),
            meaning_uri: None,
            name: name.to_string(),
            multiple: record.multiple,
            value: Some(value),
        })
    }

    fn encode_value(
        &self,
        name: &str,
        value: &Value,
    ) -> Result<(i32, legacy::PropertyValue), TranslateError> {
        let mut pv = legacy::PropertyValue::default();

        match value {
            Value::Null => {}
            Value::Int(v) => pv.int64_value = Some(*v),
            Value::Double(v) => pv.double_value = Some(*v),
            Value::Bool(v) => pv.boolean_value = Some(*v),
            Value::String(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::Text(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::ShortBlob(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::Blob(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::DateTime(v) => pv.int64_value = Some(v.micros()),
            Value::GeoPt(v) => {
                pv.point_value = Some(legacy::PointValue {
                    x: v.latitude(),
                    y: v.longitude(),
                });
            }
            Value::User(v) => pv.user_value = Some(user_to_wire(v)),
            Value::Key(v) => pv.reference_value = Some(key_codec::key_to_reference_value(v)),
            Value::Entity(v) => {
                pv.string_value = Some(self.encode_embedded(v)?.encode_to_vec());
            }
            Value::Link(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::Category(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::Email(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::PostalAddress(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::PhoneNumber(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::BlobKey(v) => pv.string_value = Some(v.as_bytes().to_vec()),
            Value::ImHandle(v) => pv.string_value = Some(v.to_wire().into_bytes()),
            Value::Rating(v) => pv.int64_value = Some(v.get()),
            Value::Raw(_) => {
                return Err(TranslateError::UnsupportedDataType {
                    property: name.to_string(),
                    value_type: ValueType::Raw,
                });
            }
        }

        Ok((value.value_type().meaning(), pv))
    }

    fn encode_embedded(&self, embedded: &EmbeddedEntity) -> Result<legacy::EntityProto, TranslateError> {
        let (property, raw_property) = self.encode_properties(embedded.properties())?;

        Ok(legacy::EntityProto {
            key: embedded.key().map(key_codec::key_to_reference),
            entity_group: None,
            property,
            raw_property,
        })
    }

    // `depth` counts the embedded entities enclosing `wire`.
    fn decode_properties(
        &self,
        wire: &legacy::EntityProto,
        depth: usize,
    ) -> Result<PropertyMap, TranslateError> {
        let mut acc = PropertyAccumulator::new(self.options);

        let records = wire
            .property
            .iter()
            .map(|p| (p, true))
            .chain(wire.raw_property.iter().map(|p| (p, false)));

        for (property, indexed) in records {
            let record = self.decode_record(property, indexed, depth)?;
            acc.push(&property.name, record);
        }

        Ok(acc.finish())
    }

    fn decode_record(
        &self,
        property: &legacy::Property,
        indexed: bool,
        depth: usize,
    ) -> Result<ReadRecord, TranslateError> {
        let meaning = property.meaning.unwrap_or(meaning::NO_MEANING);
        if meaning == meaning::EMPTY_LIST {
            return Ok(ReadRecord::EmptyList { indexed });
        }

        let empty = legacy::PropertyValue::default();
        let pv = property.value.as_ref().unwrap_or(&empty);
        let value = if pv.is_empty() {
            Value::Null
        } else {
            self.decode_value(&property.name, meaning, pv, depth)?
        };
        trace!(property = %property.name, meaning, indexed, "legacy record decoded");

        Ok(ReadRecord::Value {
            value,
            indexed,
            multiple: property.multiple,
        })
    }

    fn decode_value(
        &self,
        name: &str,
        meaning: i32,
        pv: &legacy::PropertyValue,
        depth: usize,
    ) -> Result<Value, TranslateError> {
        let registered = meaning::is_known(meaning)
            .then(|| ValueType::for_meaning(meaning))
            .flatten();

        let value_type = match registered {
            Some(ty) if has_value(ty, pv) => ty,
            Some(ty) => {
                warn!(property = name, meaning, expected = %ty, "legacy value shape does not match its meaning; reading as null");
                return Ok(Value::Null);
            }
            None => match ValueType::MEANINGLESS_PROBE_ORDER
                .into_iter()
                .find(|ty| has_value(*ty, pv))
            {
                Some(ty) => ty,
                None => {
                    warn!(property = name, meaning, "legacy value has no recognizable shape; reading as null");
                    return Ok(Value::Null);
                }
            },
        };

        match self.read_as(name, value_type, pv, depth)? {
            Some(value) => Ok(value),
            None => {
                warn!(property = name, value_type = %value_type, "legacy value failed conversion; reading as null");
                Ok(Value::Null)
            }
        }
    }

    // `None` when the payload has the right shape but an unusable content.
    fn read_as(
        &self,
        name: &str,
        value_type: ValueType,
        pv: &legacy::PropertyValue,
        depth: usize,
    ) -> Result<Option<Value>, TranslateError> {
        let bytes = pv.string_value.as_deref();
        let text = || bytes.and_then(|b| std::str::from_utf8(b).ok()).map(str::to_string);

        let value = match value_type {
            ValueType::Null => Some(Value::Null),
            ValueType::Int => pv.int64_value.map(Value::Int),
            ValueType::Double => pv.double_value.map(Value::Double),
            ValueType::Bool => pv.boolean_value.map(Value::Bool),
            ValueType::String => text().map(Value::String),
            ValueType::Text => text().map(|s| Value::Text(Text::new(s))),
            ValueType::ShortBlob => bytes.map(|b| Value::ShortBlob(ShortBlob::new(b.to_vec()))),
            ValueType::Blob => bytes.map(|b| Value::Blob(Blob::new(b.to_vec()))),
            ValueType::DateTime => pv
                .int64_value
                .map(|v| Value::DateTime(DateTime::from_micros(v))),
            ValueType::GeoPt => pv
                .point_value
                .as_ref()
                .and_then(|p| GeoPt::new(p.x, p.y).ok())
                .map(Value::GeoPt),
            ValueType::User => pv.user_value.as_ref().map(|u| Value::User(user_from_wire(u))),
            ValueType::Key => match &pv.reference_value {
                Some(reference) => Some(Value::Key(key_codec::reference_value_to_key(reference)?)),
                None => None,
            },
            ValueType::Entity => match bytes {
                // prost's recursion limit does not span separate decodes.
                Some(_) if depth >= MAX_EMBEDDED_DEPTH => {
                    return Err(TranslateError::NestingTooDeep {
                        property: name.to_string(),
                        limit: MAX_EMBEDDED_DEPTH,
                    });
                }
                Some(b) => {
                    let nested = legacy::EntityProto::decode(b).map_err(|source| {
                        TranslateError::EmbeddedDecode {
                            property: name.to_string(),
                            source,
                        }
                    })?;
                    Some(Value::Entity(self.decode_embedded(&nested, depth + 1)?))
                }
                None => None,
            },
            ValueType::Link => text().map(|s| Value::Link(Link::new(s))),
            ValueType::Category => text().map(|s| Value::Category(Category::new(s))),
            ValueType::Email => text().map(|s| Value::Email(Email::new(s))),
            ValueType::PostalAddress => text().map(|s| Value::PostalAddress(PostalAddress::new(s))),
            ValueType::PhoneNumber => text().map(|s| Value::PhoneNumber(PhoneNumber::new(s))),
            ValueType::BlobKey => text().map(|s| Value::BlobKey(BlobKey::new(s))),
            ValueType::ImHandle => text().and_then(|s| ImHandle::parse(&s)).map(Value::ImHandle),
            ValueType::Rating => pv
                .int64_value
                .and_then(|v| Rating::new(v).ok())
                .map(Value::Rating),
            ValueType::Raw => raw_scalar(pv)?.map(|c| Value::Raw(RawValue::new(c))),
        };

        Ok(value)
    }

    fn decode_embedded(
        &self,
        wire: &legacy::EntityProto,
        depth: usize,
    ) -> Result<EmbeddedEntity, TranslateError> {
        let key = wire
            .key
            .as_ref()
            .map(key_codec::reference_to_key)
            .transpose()?;

        Ok(EmbeddedEntity::from_parts(key, self.decode_properties(wire, depth)?))
    }
}

impl WireCodec for LegacyCodec {
    type Entity = legacy::EntityProto;

    const PROTOCOL: Protocol = Protocol::Legacy;

    fn encode_entity(&self, entity: &Entity) -> Result<legacy::EntityProto, TranslateError> {
        let (property, raw_property) = self.encode_properties(entity.properties())?;
        let root = entity.key().root();
        let entity_group = root
            .is_complete()
            .then(|| key_codec::key_to_path(root))
            .unwrap_or_default();

        Ok(legacy::EntityProto {
            key: Some(key_codec::key_to_reference(entity.key())),
            entity_group: Some(entity_group),
            property,
            raw_property,
        })
    }

    fn decode_entity(&self, wire: &legacy::EntityProto) -> Result<Entity, TranslateError> {
        let reference = wire.key.as_ref().ok_or(TranslateError::MissingKey)?;
        let key = key_codec::reference_to_key(reference)?;

        Ok(Entity::from_parts(key, self.decode_properties(wire, 0)?))
    }
}

///
/// HELPERS
///

fn bucket<'a, T>(indexed: &'a mut Vec<T>, raw: &'a mut Vec<T>, is_indexed: bool) -> &'a mut Vec<T> {
    if is_indexed { indexed } else { raw }
}

fn marker_record(name: &str, meaning: i32) -> legacy::Property {
    legacy::Property {
        meaning: (meaning != meaning::NO_MEANING).then_some(meaning),
        meaning_uri: None,
        name: name.to_string(),
        multiple: false,
        value: Some(legacy::PropertyValue::default()),
    }
}

/// Structural shape check for a type's legacy payload.
///
/// The string check accepts any bytes. Content that is not UTF-8 passes
/// here and only fails in conversion, where it degrades to null.
pub(crate) const fn has_value(value_type: ValueType, pv: &legacy::PropertyValue) -> bool {
    match value_type {
        ValueType::Null => pv.is_empty(),
        ValueType::Int | ValueType::DateTime | ValueType::Rating => pv.int64_value.is_some(),
        ValueType::Double => pv.double_value.is_some(),
        ValueType::Bool => pv.boolean_value.is_some(),
        ValueType::GeoPt => pv.point_value.is_some(),
        ValueType::User => pv.user_value.is_some(),
        ValueType::Key => pv.reference_value.is_some(),
        ValueType::String
        | ValueType::Text
        | ValueType::ShortBlob
        | ValueType::Blob
        | ValueType::Entity
        | ValueType::Link
        | ValueType::Category
        | ValueType::Email
        | ValueType::PostalAddress
        | ValueType::PhoneNumber
        | ValueType::ImHandle
        | ValueType::BlobKey => pv.string_value.is_some(),
        ValueType::Raw => !pv.is_empty(),
    }
}

fn user_to_wire(user: &User) -> legacy::UserValue {
    legacy::UserValue {
        email: user.email.clone(),
        auth_domain: user.auth_domain.clone(),
        nickname: None,
        federated_identity: user.federated_identity.clone(),
        federated_provider: None,
        obfuscated_gaiaid: user.user_id.clone(),
    }
}

fn user_from_wire(user: &legacy::UserValue) -> User {
    User {
        email: user.email.clone(),
        auth_domain: user.auth_domain.clone(),
        user_id: user.obfuscated_gaiaid.clone(),
        federated_identity: user.federated_identity.clone(),
    }
}

// Index scalar of an `INDEX_VALUE` record.
fn raw_scalar(pv: &legacy::PropertyValue) -> Result<Option<Comparable>, TranslateError> {
    let scalar = if let Some(v) = pv.int64_value {
        Comparable::Int(v)
    } else if let Some(v) = pv.boolean_value {
        Comparable::Bool(v)
    } else if let Some(bytes) = &pv.string_value {
        Comparable::bytes(bytes.clone())
    } else if let Some(v) = pv.double_value {
        Comparable::Double(v)
    } else if let Some(p) = &pv.point_value {
        match GeoPt::new(p.x, p.y) {
            Ok(point) => Comparable::GeoPt(point),
            Err(_) => return Ok(None),
        }
    } else if let Some(u) = &pv.user_value {
        Comparable::User(user_from_wire(u))
    } else if let Some(reference) = &pv.reference_value {
        Comparable::Key(key_codec::reference_value_to_key(reference)?)
    } else {
        Comparable::Null
    };

    Ok(Some(scalar))
}
