use crate::{
    key::KEY_PROPERTY,
    query::{Filter, FilterOperand, FilterOperator, FilterPredicate, Query},
};
use std::collections::BTreeSet;
use tracing::debug;

///
/// Normalize a query into its canonical form.
///
/// Rewrites, in order:
/// 1. single-valued `IN` becomes `EQUAL`
/// 2. exact duplicate equality filters are dropped
/// 3. a property with both equality and inequality filters counts as
///    inequality only
/// 4. repeated orders and orders on equality properties are dropped
/// 5. an equality filter on `__key__` drops every order; orders after the
///    first `__key__` order are truncated
/// 6. `EXISTS` filters on properties already covered by a filter or order
///    are dropped
/// 7. `EXISTS` filters are appended for uncovered projection, then group-by,
///    properties
///
/// Composite filters pass through untouched. The pass is pure and
/// idempotent.
///
#[must_use]
pub fn normalize(query: &Query) -> Query {
    let mut normalized = query.clone();

    normalized.filters = dedupe_equalities(&query.filters);

    let inequality: BTreeSet<String> = property_names(&normalized, FilterOperator::is_inequality);
    let mut covered: BTreeSet<String> = property_names(&normalized, FilterOperator::is_equality)
        .into_iter()
        .filter(|p| !inequality.contains(p))
        .collect();

    // Orders on equality properties or repeated orders are redundant.
    normalized
        .sort_orders
        .retain(|order| covered.insert(order.property.clone()));

    if normalized.predicates().any(FilterPredicate::is_key_equality) {
        if !normalized.sort_orders.is_empty() {
            debug!(orders = normalized.sort_orders.len(), "key equality filter drops all orders");
        }
        normalized.sort_orders.clear();
    }
    if let Some(pos) = normalized
        .sort_orders
        .iter()
        .position(|order| order.property == KEY_PROPERTY)
    {
        normalized.sort_orders.truncate(pos + 1);
    }

    // Coverage is rebuilt from the surviving orders so that a second pass
    // sees the same set.
    let mut covered: BTreeSet<String> = property_names(&normalized, FilterOperator::is_equality)
        .into_iter()
        .chain(inequality)
        .chain(normalized.sort_orders.iter().map(|o| o.property.clone()))
        .collect();

    normalized.filters.retain(|filter| match filter {
        Filter::Property(p) if p.op == FilterOperator::Exists => {
            let keep = covered.insert(p.property.clone());
            if !keep {
                debug!(property = %p.property, "redundant exists filter dropped");
            }
            keep
        }
        _ => true,
    });

    for property in query.projections.iter().chain(&query.group_by) {
        if covered.insert(property.clone()) {
            normalized.filters.push(Filter::exists(property.clone()));
        }
    }

    normalized
}

// Steps 1 and 2.
fn dedupe_equalities(filters: &[Filter]) -> Vec<Filter> {
    let mut seen: Vec<FilterPredicate> = Vec::new();
    let mut out = Vec::with_capacity(filters.len());

    for filter in filters {
        let Filter::Property(predicate) = filter else {
            out.push(filter.clone());
            continue;
        };

        let predicate = single_in_to_equal(predicate);
        if predicate.op == FilterOperator::Equal {
            if seen.contains(&predicate) {
                debug!(property = %predicate.property, "duplicate equality filter dropped");
                continue;
            }
            seen.push(predicate.clone());
        }
        out.push(Filter::Property(predicate));
    }

    out
}

fn single_in_to_equal(predicate: &FilterPredicate) -> FilterPredicate {
    match (&predicate.op, &predicate.operand) {
        (FilterOperator::In, FilterOperand::Values(values)) if values.len() == 1 => {
            FilterPredicate::new(
                predicate.property.clone(),
                FilterOperator::Equal,
                FilterOperand::Value(values[0].clone()),
            )
        }
        _ => predicate.clone(),
    }
}

fn property_names(query: &Query, select: impl Fn(FilterOperator) -> bool) -> BTreeSet<String> {
    query
        .predicates()
        .filter(|p| select(p.op))
        .map(|p| p.property.clone())
        .collect()
}
