//! Query model, normalization, validation and wire preparation.
//!
//! A query is built incrementally, then `prepare` runs distinct promotion,
//! `normalize`, `validate` and the protocol-specific builder in that order.

mod cursor;
mod normalize;
mod validate;
mod wire;

#[cfg(test)]
mod tests;

use crate::{
    context::AppNamespace,
    key::{KEY_PROPERTY, Key},
    value::{GeoPt, Value},
};
use std::{collections::BTreeSet, fmt};

// re-exports
pub use cursor::{Cursor, CursorError};
pub use normalize::normalize;
pub use validate::{IllegalQueryType, ValidateError, validate};
pub use wire::{PrepareError, PreparedQuery, prepare, prepare_legacy, prepare_public};

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

///
/// SortOrder
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SortOrder {
    pub property: String,
    pub direction: SortDirection,
}

impl SortOrder {
    #[must_use]
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}

///
/// FilterOperator
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FilterOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    In,
    Exists,
    ContainedInRegion,
}

impl FilterOperator {
    #[must_use]
    pub const fn is_inequality(self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::LessThanOrEqual | Self::GreaterThan | Self::GreaterThanOrEqual
        )
    }

    #[must_use]
    pub const fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::In)
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::In => "IN",
            Self::Exists => "EXISTS",
            Self::ContainedInRegion => "CONTAINED_IN_REGION",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// Circle
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: GeoPt,
    pub radius_meters: f64,
}

///
/// Rectangle
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    pub southwest: GeoPt,
    pub northeast: GeoPt,
}

///
/// GeoRegion
///
/// Region operand of a `ContainedInRegion` filter. A valid region sets
/// exactly one shape; the validator enforces this.
///

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoRegion {
    pub circle: Option<Circle>,
    pub rectangle: Option<Rectangle>,
}

impl GeoRegion {
    #[must_use]
    pub const fn circle(center: GeoPt, radius_meters: f64) -> Self {
        Self {
            circle: Some(Circle {
                center,
                radius_meters,
            }),
            rectangle: None,
        }
    }

    #[must_use]
    pub const fn rectangle(southwest: GeoPt, northeast: GeoPt) -> Self {
        Self {
            circle: None,
            rectangle: Some(Rectangle {
                southwest,
                northeast,
            }),
        }
    }

    #[must_use]
    pub const fn shape_count(&self) -> usize {
        self.circle.is_some() as usize + self.rectangle.is_some() as usize
    }
}

///
/// FilterOperand
///

#[derive(Clone, Debug, PartialEq)]
pub enum FilterOperand {
    None,
    Value(Value),
    Values(Vec<Value>),
    Region(GeoRegion),
}

///
/// FilterPredicate
///

#[derive(Clone, Debug, PartialEq)]
pub struct FilterPredicate {
    pub property: String,
    pub op: FilterOperator,
    pub operand: FilterOperand,
}

impl FilterPredicate {
    #[must_use]
    pub fn new(property: impl Into<String>, op: FilterOperator, operand: FilterOperand) -> Self {
        Self {
            property: property.into(),
            op,
            operand,
        }
    }

    #[must_use]
    pub fn is_key_equality(&self) -> bool {
        self.op == FilterOperator::Equal && self.property == KEY_PROPERTY
    }
}

///
/// CompositeOperator
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompositeOperator {
    And,
    Or,
}

///
/// CompositeFilter
///

#[derive(Clone, Debug, PartialEq)]
pub struct CompositeFilter {
    pub op: CompositeOperator,
    pub filters: Vec<Filter>,
}

impl CompositeFilter {
    /// Distinct property names referenced anywhere inside the composite.
    #[must_use]
    pub fn properties(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        for filter in &self.filters {
            match filter {
                Filter::Property(p) => {
                    out.insert(p.property.as_str());
                }
                Filter::Composite(c) => out.extend(c.properties()),
            }
        }
        out
    }
}

///
/// Filter
///

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Property(FilterPredicate),
    Composite(CompositeFilter),
}

impl Filter {
    fn compare(property: impl Into<String>, op: FilterOperator, value: impl Into<Value>) -> Self {
        Self::Property(FilterPredicate::new(
            property,
            op,
            FilterOperand::Value(value.into()),
        ))
    }

    #[must_use]
    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, FilterOperator::Equal, value)
    }

    #[must_use]
    pub fn ne(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, FilterOperator::NotEqual, value)
    }

    #[must_use]
    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, FilterOperator::LessThan, value)
    }

    #[must_use]
    pub fn lte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, FilterOperator::LessThanOrEqual, value)
    }

    #[must_use]
    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, FilterOperator::GreaterThan, value)
    }

    #[must_use]
    pub fn gte(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, FilterOperator::GreaterThanOrEqual, value)
    }

    #[must_use]
    pub fn in_(property: impl Into<String>, values: Vec<Value>) -> Self {
        Self::Property(FilterPredicate::new(
            property,
            FilterOperator::In,
            FilterOperand::Values(values),
        ))
    }

    #[must_use]
    pub fn exists(property: impl Into<String>) -> Self {
        Self::Property(FilterPredicate::new(
            property,
            FilterOperator::Exists,
            FilterOperand::None,
        ))
    }

    #[must_use]
    pub fn in_region(property: impl Into<String>, region: GeoRegion) -> Self {
        Self::Property(FilterPredicate::new(
            property,
            FilterOperator::ContainedInRegion,
            FilterOperand::Region(region),
        ))
    }

    #[must_use]
    pub const fn and(filters: Vec<Self>) -> Self {
        Self::Composite(CompositeFilter {
            op: CompositeOperator::And,
            filters,
        })
    }

    #[must_use]
    pub const fn or(filters: Vec<Self>) -> Self {
        Self::Composite(CompositeFilter {
            op: CompositeOperator::Or,
            filters,
        })
    }

    #[must_use]
    pub const fn as_predicate(&self) -> Option<&FilterPredicate> {
        match self {
            Self::Property(p) => Some(p),
            Self::Composite(_) => None,
        }
    }
}

///
/// Query
///
/// Fields are public so callers can assemble a query directly; the fluent
/// builders additionally enforce the construction invariants and report
/// violations with the tag the validator would use.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub scope: AppNamespace,
    pub kind: Option<String>,
    pub ancestor: Option<Key>,
    pub filters: Vec<Filter>,
    pub sort_orders: Vec<SortOrder>,
    pub projections: Vec<String>,
    pub group_by: Vec<String>,
    pub keys_only: bool,
    pub distinct: bool,
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
    pub offset: Option<i32>,
    pub limit: Option<i32>,
}

impl Query {
    #[must_use]
    pub fn new(scope: AppNamespace, kind: impl Into<String>) -> Self {
        Self {
            scope,
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kindless(scope: AppNamespace) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Restrict to descendants of `ancestor`, which must be complete and
    /// share the query's scope.
    pub fn ancestor(mut self, ancestor: Key) -> Result<Self, ValidateError> {
        if !ancestor.is_complete() {
            return Err(ValidateError::IncompleteAncestor {
                key: ancestor.to_string(),
            });
        }
        if ancestor.scope() != &self.scope {
            return Err(ValidateError::AncestorScopeMismatch {
                ancestor: ancestor.scope().clone(),
                query: self.scope,
            });
        }

        self.ancestor = Some(ancestor);
        Ok(self)
    }

    /// Add a filter to the implicit top-level conjunction. `And` composites
    /// are flattened into it.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        match filter {
            Filter::Composite(CompositeFilter {
                op: CompositeOperator::And,
                filters,
            }) => {
                for inner in filters {
                    self = self.filter(inner);
                }
            }
            other => self.filters.push(other),
        }
        self
    }

    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.sort_orders.push(order);
        self
    }

    pub fn project(mut self, property: impl Into<String>) -> Result<Self, ValidateError> {
        let property = property.into();
        if self.keys_only {
            return Err(ValidateError::ProjectionWithKeysOnly);
        }
        if self.projections.contains(&property) {
            return Err(ValidateError::DuplicateProjection { property });
        }

        self.projections.push(property);
        Ok(self)
    }

    pub fn keys_only(mut self) -> Result<Self, ValidateError> {
        if !self.projections.is_empty() {
            return Err(ValidateError::ProjectionWithKeysOnly);
        }

        self.keys_only = true;
        Ok(self)
    }

    #[must_use]
    pub fn group_by(mut self, property: impl Into<String>) -> Self {
        self.group_by.push(property.into());
        self
    }

    #[must_use]
    pub const fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    #[must_use]
    pub fn start_cursor(mut self, cursor: Cursor) -> Self {
        self.start_cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn end_cursor(mut self, cursor: Cursor) -> Self {
        self.end_cursor = Some(cursor);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: i32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Property filters of the top-level conjunction.
    pub fn predicates(&self) -> impl Iterator<Item = &FilterPredicate> {
        self.filters.iter().filter_map(Filter::as_predicate)
    }

    /// Copy with `distinct` promoted to grouping on every projection.
    #[must_use]
    pub fn with_distinct_promoted(&self) -> Self {
        let mut query = self.clone();
        if query.distinct {
            for property in &self.projections {
                if !query.group_by.contains(property) {
                    query.group_by.push(property.clone());
                }
            }
        }
        query
    }
}
