use crate::{
    context::AppContext,
    key::KEY_PROPERTY,
    query::{
        Filter, FilterOperand, FilterOperator, FilterPredicate, GeoRegion, Query, SortDirection,
        ValidateError, normalize, validate,
    },
    translate::{
        LegacyCodec, Protocol, PublicCodec, TranslateError, TranslateOptions, WireRecord,
        key as key_codec,
    },
    value::{GeoPt, Value},
};
use nimbus_proto::{legacy, public};
use thiserror::Error as ThisError;
use tracing::debug;

///
/// PrepareError
///

#[derive(Debug, ThisError)]
pub enum PrepareError {
    #[error(transparent)]
    Invalid(#[from] ValidateError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("geo-spatial filter on '{property}' cannot be expressed in the public protocol")]
    GeoUnsupported { property: String },
}

///
/// PreparedQuery
///

#[derive(Clone, Debug, PartialEq)]
pub enum PreparedQuery {
    Legacy(legacy::Query),
    Public(public::RunQueryRequest),
}

impl PreparedQuery {
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Legacy(_) => Protocol::Legacy,
            Self::Public(_) => Protocol::Public,
        }
    }

    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        use nimbus_proto::Message;

        match self {
            Self::Legacy(query) => query.encode_to_vec(),
            Self::Public(request) => request.encode_to_vec(),
        }
    }
}

///
/// Run the full query pipeline: distinct promotion, normalization,
/// validation, then the protocol builder.
///
pub fn prepare(
    query: &Query,
    protocol: Protocol,
    context: &AppContext,
) -> Result<PreparedQuery, PrepareError> {
    let query = normalize(&query.with_distinct_promoted());
    validate(&query)?;

    debug!(kind = ?query.kind, filters = query.filters.len(), ?protocol, "query prepared");

    match protocol {
        Protocol::Legacy => prepare_legacy(&query).map(PreparedQuery::Legacy),
        Protocol::Public => prepare_public(&query, context).map(PreparedQuery::Public),
    }
}

///
/// LEGACY
///

/// Legacy query message for an already normalized and validated query.
pub fn prepare_legacy(query: &Query) -> Result<legacy::Query, PrepareError> {
    let codec = LegacyCodec::default();

    let filter = query
        .filters
        .iter()
        .filter_map(Filter::as_predicate)
        .map(|p| legacy_filter(&codec, p))
        .collect::<Result<Vec<_>, _>>()?;

    let order = query
        .sort_orders
        .iter()
        .map(|o| legacy::Order {
            property: o.property.clone(),
            direction: match o.direction {
                SortDirection::Ascending => legacy::Direction::Ascending,
                SortDirection::Descending => legacy::Direction::Descending,
            } as i32,
        })
        .collect();

    Ok(legacy::Query {
        app: query.scope.app_id.clone(),
        name_space: key_codec::namespace_field(&query.scope),
        kind: query.kind.clone(),
        ancestor: query.ancestor.as_ref().map(key_codec::key_to_reference),
        filter,
        order,
        keys_only: query.keys_only,
        property_name: query.projections.clone(),
        group_by_property_name: query.group_by.clone(),
        distinct: query.distinct,
        compiled_cursor: query.start_cursor.as_ref().map(|c| c.as_bytes().to_vec()),
        end_compiled_cursor: query.end_cursor.as_ref().map(|c| c.as_bytes().to_vec()),
        offset: query.offset,
        limit: query.limit,
        transaction: None,
    })
}

fn legacy_filter(
    codec: &LegacyCodec,
    predicate: &FilterPredicate,
) -> Result<legacy::Filter, PrepareError> {
    let name = predicate.property.as_str();
    let op = legacy_op(predicate.op);

    let (property, geo_region) = match &predicate.operand {
        FilterOperand::None => (vec![legacy_property(codec, name, &Value::Null, false)?], None),
        FilterOperand::Value(value) => (vec![legacy_property(codec, name, value, false)?], None),
        FilterOperand::Values(values) => (
            values
                .iter()
                .map(|v| legacy_property(codec, name, v, true))
                .collect::<Result<Vec<_>, _>>()?,
            None,
        ),
        FilterOperand::Region(region) => (
            vec![legacy_property(codec, name, &Value::Null, false)?],
            Some(legacy_region(region)),
        ),
    };

    Ok(legacy::Filter {
        op: op as i32,
        property,
        geo_region,
    })
}

fn legacy_property(
    codec: &LegacyCodec,
    name: &str,
    value: &Value,
    multiple: bool,
) -> Result<legacy::Property, TranslateError> {
    codec.encode_record(
        name,
        &WireRecord {
            value,
            indexed: true,
            multiple,
        },
    )
}

const fn legacy_op(op: FilterOperator) -> legacy::FilterOp {
    match op {
        FilterOperator::LessThan => legacy::FilterOp::LessThan,
        FilterOperator::LessThanOrEqual => legacy::FilterOp::LessThanOrEqual,
        FilterOperator::GreaterThan => legacy::FilterOp::GreaterThan,
        FilterOperator::GreaterThanOrEqual => legacy::FilterOp::GreaterThanOrEqual,
        // not-equal never survives validation
        FilterOperator::Equal | FilterOperator::NotEqual => legacy::FilterOp::Equal,
        FilterOperator::In => legacy::FilterOp::In,
        FilterOperator::Exists => legacy::FilterOp::Exists,
        FilterOperator::ContainedInRegion => legacy::FilterOp::ContainedInRegion,
    }
}

fn legacy_region(region: &GeoRegion) -> legacy::GeoRegion {
    let point = |p: GeoPt| legacy::RegionPoint {
        latitude: p.latitude(),
        longitude: p.longitude(),
    };

    legacy::GeoRegion {
        circle: region.circle.map(|c| legacy::CircleRegion {
            center: Some(point(c.center)),
            radius_meters: c.radius_meters,
        }),
        rectangle: region.rectangle.map(|r| legacy::RectangleRegion {
            southwest: Some(point(r.southwest)),
            northeast: Some(point(r.northeast)),
        }),
    }
}

///
/// PUBLIC
///

/// Public run-query request for an already normalized and validated query.
/// Exists filters are dropped; projections already imply them.
pub fn prepare_public(
    query: &Query,
    context: &AppContext,
) -> Result<public::RunQueryRequest, PrepareError> {
    let codec = PublicCodec::new(TranslateOptions::default(), context.clone());
    let project_id = context
        .project_id_for_app(&query.scope.app_id)
        .map_err(TranslateError::from)?;

    let mut filters = Vec::new();
    if let Some(ancestor) = &query.ancestor {
        let key = key_codec::key_to_public(ancestor, context)?;
        filters.push(property_filter(
            KEY_PROPERTY,
            public::PropertyOperator::HasAncestor,
            key_value(key),
        ));
    }
    for predicate in query.filters.iter().filter_map(Filter::as_predicate) {
        if let Some(filter) = public_filter(&codec, predicate)? {
            filters.push(filter);
        }
    }

    let filter = match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(public::Filter {
            filter_type: Some(public::filter::FilterType::CompositeFilter(
                public::CompositeFilter {
                    op: public::CompositeOperator::And as i32,
                    filters,
                },
            )),
        }),
    };

    let projection = if query.keys_only {
        vec![projection(KEY_PROPERTY)]
    } else {
        query.projections.iter().map(|p| projection(p)).collect()
    };

    let order = query
        .sort_orders
        .iter()
        .map(|o| public::PropertyOrder {
            property: Some(property_reference(&o.property)),
            direction: match o.direction {
                SortDirection::Ascending => public::Direction::Ascending,
                SortDirection::Descending => public::Direction::Descending,
            } as i32,
        })
        .collect();

    Ok(public::RunQueryRequest {
        project_id: project_id.clone(),
        partition_id: Some(public::PartitionId {
            project_id,
            namespace_id: query.scope.namespace.clone(),
        }),
        query: Some(public::Query {
            projection,
            kind: query
                .kind
                .iter()
                .map(|name| public::KindExpression { name: name.clone() })
                .collect(),
            filter,
            order,
            distinct_on: query.group_by.iter().map(|p| property_reference(p)).collect(),
            start_cursor: query
                .start_cursor
                .as_ref()
                .map(|c| c.as_bytes().to_vec())
                .unwrap_or_default(),
            end_cursor: query
                .end_cursor
                .as_ref()
                .map(|c| c.as_bytes().to_vec())
                .unwrap_or_default(),
            offset: query.offset.unwrap_or_default(),
            limit: query.limit,
        }),
    })
}

fn public_filter(
    codec: &PublicCodec,
    predicate: &FilterPredicate,
) -> Result<Option<public::Filter>, PrepareError> {
    let name = predicate.property.as_str();
    let encode = |value: &Value| {
        codec.encode_record(
            name,
            &WireRecord {
                value,
                indexed: true,
                multiple: false,
            },
        )
    };

    let (op, value) = match (predicate.op, &predicate.operand) {
        (FilterOperator::Exists, _) => return Ok(None),
        (FilterOperator::ContainedInRegion, _) => {
            return Err(PrepareError::GeoUnsupported {
                property: predicate.property.clone(),
            });
        }
        (FilterOperator::In, FilterOperand::Values(values)) => {
            let values = values.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
            (public::PropertyOperator::In, array_value(values))
        }
        (op, FilterOperand::Value(value)) => (public_op(op), encode(value)?),
        (op, _) => (public_op(op), encode(&Value::Null)?),
    };

    Ok(Some(property_filter(name, op, value)))
}

const fn public_op(op: FilterOperator) -> public::PropertyOperator {
    match op {
        FilterOperator::LessThan => public::PropertyOperator::LessThan,
        FilterOperator::LessThanOrEqual => public::PropertyOperator::LessThanOrEqual,
        FilterOperator::GreaterThan => public::PropertyOperator::GreaterThan,
        FilterOperator::GreaterThanOrEqual => public::PropertyOperator::GreaterThanOrEqual,
        FilterOperator::Equal => public::PropertyOperator::Equal,
        FilterOperator::NotEqual => public::PropertyOperator::NotEqual,
        FilterOperator::In => public::PropertyOperator::In,
        FilterOperator::Exists | FilterOperator::ContainedInRegion => {
            public::PropertyOperator::Unspecified
        }
    }
}

fn property_filter(
    name: &str,
    op: public::PropertyOperator,
    value: public::Value,
) -> public::Filter {
    public::Filter {
        filter_type: Some(public::filter::FilterType::PropertyFilter(
            public::PropertyFilter {
                property: Some(property_reference(name)),
                op: op as i32,
                value: Some(value),
            },
        )),
    }
}

fn property_reference(name: &str) -> public::PropertyReference {
    public::PropertyReference {
        name: name.to_string(),
    }
}

fn projection(name: &str) -> public::Projection {
    public::Projection {
        property: Some(property_reference(name)),
    }
}

fn key_value(key: public::Key) -> public::Value {
    public::Value {
        meaning: 0,
        exclude_from_indexes: false,
        value_type: Some(public::value::ValueType::KeyValue(key)),
    }
}

fn array_value(values: Vec<public::Value>) -> public::Value {
    public::Value {
        meaning: 0,
        exclude_from_indexes: false,
        value_type: Some(public::value::ValueType::ArrayValue(public::ArrayValue {
            values,
        })),
    }
}
