use crate::{
    context::AppNamespace,
    entity::is_reserved_name,
    key::KEY_PROPERTY,
    query::{Filter, FilterOperand, FilterOperator, FilterPredicate, Query, SortDirection},
    value::Value,
};
use std::{collections::BTreeSet, fmt};
use thiserror::Error as ThisError;

///
/// IllegalQueryType
///
/// Stable reason tag of a rejected query.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IllegalQueryType {
    KindRequired,
    UnsupportedFilter,
    MultipleInequalityFilters,
    FirstSortNotInequalityProperty,
    IllegalValue,
    IllegalProjection,
    IllegalGroupBy,
    MultiPropertyFilter,
    CursorWithGeoQuery,
}

impl fmt::Display for IllegalQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::KindRequired => "kind_required",
            Self::UnsupportedFilter => "unsupported_filter",
            Self::MultipleInequalityFilters => "multiple_inequality_filters",
            Self::FirstSortNotInequalityProperty => "first_sort_not_inequality_property",
            Self::IllegalValue => "illegal_value",
            Self::IllegalProjection => "illegal_projection",
            Self::IllegalGroupBy => "illegal_group_by",
            Self::MultiPropertyFilter => "multi_property_filter",
            Self::CursorWithGeoQuery => "cursor_with_geo_query",
        };
        f.write_str(label)
    }
}

///
/// ValidateError
///
/// A query the backend cannot execute. Raised before any RPC.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidateError {
    #[error("projection and keys-only cannot be combined")]
    ProjectionWithKeysOnly,

    #[error("cannot project property '{property}' more than once")]
    DuplicateProjection { property: String },

    #[error("cannot group by property '{property}' more than once")]
    DuplicateGroupBy { property: String },

    #[error("cannot group by reserved property '{property}'")]
    ReservedGroupBy { property: String },

    #[error("group-by property '{property}' must be ordered before all other orders")]
    GroupByNotSortPrefix { property: String },

    #[error("kind is required for all filters except on __key__ (found '{property}')")]
    KindlessFilter { property: String },

    #[error("kind is required for all orders except __key__ ascending (found '{property}')")]
    KindlessOrder { property: String },

    #[error("ancestor key {key} is incomplete")]
    IncompleteAncestor { key: String },

    #[error("ancestor scope '{ancestor}' does not match query scope '{query}'")]
    AncestorScopeMismatch {
        ancestor: AppNamespace,
        query: AppNamespace,
    },

    #[error("a filter may reference one property, found {count}")]
    MultiPropertyFilter { count: usize },

    #[error("composite filter on '{property}' is not supported")]
    UnsupportedComposite { property: String },

    #[error("__key__ filter value must be a key")]
    KeyFilterNotKey,

    #[error("__key__ filter scope '{value}' does not match query scope '{query}'")]
    KeyFilterScopeMismatch {
        value: AppNamespace,
        query: AppNamespace,
    },

    #[error("only one inequality property is allowed per query (found '{first}' and '{second}')")]
    MultipleInequality { first: String, second: String },

    #[error("cannot project a property with an equality filter: '{property}'")]
    EqualityOnProjection { property: String },

    #[error("cannot group by a property with an equality filter: '{property}'")]
    EqualityOnGroupBy { property: String },

    #[error("operator {op} on '{property}' is not supported")]
    UnsupportedOperator {
        property: String,
        op: FilterOperator,
    },

    #[error("operator {op} on '{property}' has a missing or malformed operand")]
    MalformedOperand {
        property: String,
        op: FilterOperator,
    },

    #[error("geo-spatial filter on '{property}' must specify a region rather than a point")]
    GeoNeedsRegion { property: String },

    #[error("geo-spatial filter on '{property}' must specify exactly one of circle or rectangle")]
    GeoRegionShape { property: String },

    #[error("geo-spatial filters cannot be combined with inequality filters")]
    GeoWithInequality,

    #[error("geo-spatial filters cannot be combined with an ancestor")]
    GeoWithAncestor,

    #[error("cursors are not supported with geo-spatial queries")]
    CursorWithGeo,

    #[error("inequality property '{property}' must also be a group-by property")]
    InequalityNotGrouped { property: String },

    #[error("first sort property must match inequality property '{inequality}' (found '{first_sort}')")]
    FirstSortMismatch {
        inequality: String,
        first_sort: String,
    },
}

impl ValidateError {
    #[must_use]
    pub const fn query_type(&self) -> IllegalQueryType {
        match self {
            Self::ProjectionWithKeysOnly
            | Self::DuplicateProjection { .. }
            | Self::EqualityOnProjection { .. } => IllegalQueryType::IllegalProjection,
            Self::DuplicateGroupBy { .. }
            | Self::ReservedGroupBy { .. }
            | Self::GroupByNotSortPrefix { .. }
            | Self::EqualityOnGroupBy { .. }
            | Self::InequalityNotGrouped { .. } => IllegalQueryType::IllegalGroupBy,
            Self::KindlessFilter { .. } | Self::KindlessOrder { .. } => {
                IllegalQueryType::KindRequired
            }
            Self::IncompleteAncestor { .. }
            | Self::AncestorScopeMismatch { .. }
            | Self::KeyFilterNotKey
            | Self::KeyFilterScopeMismatch { .. }
            | Self::MalformedOperand { .. } => IllegalQueryType::IllegalValue,
            Self::MultiPropertyFilter { .. } => IllegalQueryType::MultiPropertyFilter,
            Self::UnsupportedComposite { .. }
            | Self::UnsupportedOperator { .. }
            | Self::GeoNeedsRegion { .. }
            | Self::GeoRegionShape { .. }
            | Self::GeoWithInequality
            | Self::GeoWithAncestor => IllegalQueryType::UnsupportedFilter,
            Self::MultipleInequality { .. } => IllegalQueryType::MultipleInequalityFilters,
            Self::CursorWithGeo => IllegalQueryType::CursorWithGeoQuery,
            Self::FirstSortMismatch { .. } => IllegalQueryType::FirstSortNotInequalityProperty,
        }
    }
}

///
/// Validate a normalized query. The first violated rule wins.
///
pub fn validate(query: &Query) -> Result<(), ValidateError> {
    validate_projection(query)?;
    validate_group_by(query)?;
    validate_kindless(query)?;
    validate_ancestor(query)?;

    let mut inequality: Option<&str> = None;
    let mut geo = false;

    for filter in &query.filters {
        let predicate = match filter {
            Filter::Property(predicate) => predicate,
            Filter::Composite(composite) => {
                let properties = composite.properties();
                if properties.len() > 1 {
                    return Err(ValidateError::MultiPropertyFilter {
                        count: properties.len(),
                    });
                }
                return Err(ValidateError::UnsupportedComposite {
                    property: properties.first().copied().unwrap_or_default().to_string(),
                });
            }
        };

        validate_predicate(query, predicate)?;

        if predicate.op.is_inequality() {
            match inequality {
                Some(first) if first != predicate.property => {
                    return Err(ValidateError::MultipleInequality {
                        first: first.to_string(),
                        second: predicate.property.clone(),
                    });
                }
                _ => inequality = Some(predicate.property.as_str()),
            }
        }
        if predicate.op == FilterOperator::ContainedInRegion {
            geo = true;
        }
    }

    if geo {
        if inequality.is_some() {
            return Err(ValidateError::GeoWithInequality);
        }
        if query.ancestor.is_some() {
            return Err(ValidateError::GeoWithAncestor);
        }
        if query.start_cursor.is_some() || query.end_cursor.is_some() {
            return Err(ValidateError::CursorWithGeo);
        }
    }

    if let Some(property) = inequality {
        if !query.group_by.is_empty() && !query.group_by.iter().any(|g| g == property) {
            return Err(ValidateError::InequalityNotGrouped {
                property: property.to_string(),
            });
        }
        if let Some(first) = query.sort_orders.first()
            && first.property != property
        {
            return Err(ValidateError::FirstSortMismatch {
                inequality: property.to_string(),
                first_sort: first.property.clone(),
            });
        }
    }

    Ok(())
}

fn validate_projection(query: &Query) -> Result<(), ValidateError> {
    if query.keys_only && !query.projections.is_empty() {
        return Err(ValidateError::ProjectionWithKeysOnly);
    }

    let mut seen = BTreeSet::new();
    for property in &query.projections {
        if !seen.insert(property) {
            return Err(ValidateError::DuplicateProjection {
                property: property.clone(),
            });
        }
    }

    Ok(())
}

fn validate_group_by(query: &Query) -> Result<(), ValidateError> {
    let mut seen = BTreeSet::new();
    for property in &query.group_by {
        if !seen.insert(property) {
            return Err(ValidateError::DuplicateGroupBy {
                property: property.clone(),
            });
        }
        if is_reserved_name(property) {
            return Err(ValidateError::ReservedGroupBy {
                property: property.clone(),
            });
        }
    }

    // Group-by orders must form a prefix of the sort orders.
    let mut past_prefix = false;
    for order in &query.sort_orders {
        if seen.contains(&order.property) {
            if past_prefix {
                return Err(ValidateError::GroupByNotSortPrefix {
                    property: order.property.clone(),
                });
            }
        } else {
            past_prefix = true;
        }
    }

    Ok(())
}

fn validate_kindless(query: &Query) -> Result<(), ValidateError> {
    if query.kind.is_some() {
        return Ok(());
    }

    for filter in &query.filters {
        match filter {
            Filter::Property(p) if p.property == KEY_PROPERTY => {}
            Filter::Property(p) => {
                return Err(ValidateError::KindlessFilter {
                    property: p.property.clone(),
                });
            }
            Filter::Composite(c) => {
                if let Some(property) = c.properties().into_iter().find(|p| *p != KEY_PROPERTY) {
                    return Err(ValidateError::KindlessFilter {
                        property: property.to_string(),
                    });
                }
            }
        }
    }

    for order in &query.sort_orders {
        if order.property != KEY_PROPERTY || order.direction != SortDirection::Ascending {
            return Err(ValidateError::KindlessOrder {
                property: order.property.clone(),
            });
        }
    }

    Ok(())
}

fn validate_ancestor(query: &Query) -> Result<(), ValidateError> {
    let Some(ancestor) = &query.ancestor else {
        return Ok(());
    };

    if !ancestor.is_complete() {
        return Err(ValidateError::IncompleteAncestor {
            key: ancestor.to_string(),
        });
    }
    if ancestor.scope() != &query.scope {
        return Err(ValidateError::AncestorScopeMismatch {
            ancestor: ancestor.scope().clone(),
            query: query.scope.clone(),
        });
    }

    Ok(())
}

fn validate_predicate(query: &Query, predicate: &FilterPredicate) -> Result<(), ValidateError> {
    let property = &predicate.property;
    let op = predicate.op;

    if property == KEY_PROPERTY {
        validate_key_operand(query, predicate)?;
    }

    if op.is_equality() {
        if query.projections.contains(property) {
            return Err(ValidateError::EqualityOnProjection {
                property: property.clone(),
            });
        }
        if query.group_by.contains(property) {
            return Err(ValidateError::EqualityOnGroupBy {
                property: property.clone(),
            });
        }
    }

    match (op, &predicate.operand) {
        (FilterOperator::NotEqual, _) => Err(ValidateError::UnsupportedOperator {
            property: property.clone(),
            op,
        }),
        (FilterOperator::In, FilterOperand::Values(values)) if values.len() > 1 => {
            Err(ValidateError::UnsupportedOperator {
                property: property.clone(),
                op,
            })
        }
        (FilterOperator::In, FilterOperand::Values(values)) if values.len() == 1 => Ok(()),
        (FilterOperator::ContainedInRegion, FilterOperand::Region(region)) => {
            if region.shape_count() == 1 {
                Ok(())
            } else {
                Err(ValidateError::GeoRegionShape {
                    property: property.clone(),
                })
            }
        }
        (FilterOperator::ContainedInRegion, _) => Err(ValidateError::GeoNeedsRegion {
            property: property.clone(),
        }),
        (FilterOperator::Exists, FilterOperand::None) => Ok(()),
        (
            FilterOperator::LessThan
            | FilterOperator::LessThanOrEqual
            | FilterOperator::GreaterThan
            | FilterOperator::GreaterThanOrEqual
            | FilterOperator::Equal,
            FilterOperand::Value(_),
        ) => Ok(()),
        _ => Err(ValidateError::MalformedOperand {
            property: property.clone(),
            op,
        }),
    }
}

fn validate_key_operand(query: &Query, predicate: &FilterPredicate) -> Result<(), ValidateError> {
    let values: &[Value] = match &predicate.operand {
        FilterOperand::Value(value) => std::slice::from_ref(value),
        FilterOperand::Values(values) => values,
        FilterOperand::None | FilterOperand::Region(_) => return Ok(()),
    };

    for value in values {
        let Value::Key(key) = value else {
            return Err(ValidateError::KeyFilterNotKey);
        };
        if key.scope() != &query.scope {
            return Err(ValidateError::KeyFilterScopeMismatch {
                value: key.scope().clone(),
                query: query.scope.clone(),
            });
        }
    }

    Ok(())
}
