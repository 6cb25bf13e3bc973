use super::*;
use crate::{
    context::AppContext,
    translate::{Protocol, TranslateError},
};
use nimbus_proto::{legacy, public};
use proptest::prelude::*;

///
/// FIXTURES
///

fn scope() -> AppNamespace {
    AppNamespace::new("s~shop", "ns")
}

fn context() -> AppContext {
    AppContext::new("s~shop", "shop").namespace("ns")
}

fn person() -> Query {
    Query::new(scope(), "Person")
}

fn alice() -> Key {
    Key::with_name(scope(), "Person", "alice").unwrap()
}

fn point(lat: f64, lon: f64) -> GeoPt {
    GeoPt::new(lat, lon).unwrap()
}

fn tag(query: &Query) -> IllegalQueryType {
    validate(query).unwrap_err().query_type()
}

fn check(query: &Query) -> Result<(), ValidateError> {
    validate(&normalize(query))
}

///
/// BUILDER
///

#[test]
fn filter_flattens_and_composites() {
    let q = person().filter(Filter::and(vec![
        Filter::eq("a", 1),
        Filter::and(vec![Filter::eq("b", 2), Filter::eq("c", 3)]),
    ]));

    let names: Vec<_> = q.predicates().map(|p| p.property.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn or_composite_is_kept_whole() {
    let q = person().filter(Filter::or(vec![Filter::eq("a", 1), Filter::eq("a", 2)]));

    assert_eq!(q.filters.len(), 1);
    assert_eq!(q.predicates().count(), 0);
}

#[test]
fn projection_after_keys_only_is_rejected() {
    let err = person().keys_only().unwrap().project("age").unwrap_err();

    assert_eq!(err, ValidateError::ProjectionWithKeysOnly);
    assert_eq!(err.query_type(), IllegalQueryType::IllegalProjection);
}

#[test]
fn keys_only_after_projection_is_rejected() {
    let err = person().project("age").unwrap().keys_only().unwrap_err();

    assert_eq!(err.query_type(), IllegalQueryType::IllegalProjection);
}

#[test]
fn duplicate_projection_is_rejected() {
    let err = person()
        .project("age")
        .unwrap()
        .project("age")
        .unwrap_err();

    assert!(matches!(err, ValidateError::DuplicateProjection { property } if property == "age"));
}

#[test]
fn incomplete_ancestor_is_rejected() {
    let incomplete = Key::incomplete(scope(), "Person").unwrap();
    let err = person().ancestor(incomplete).unwrap_err();

    assert!(matches!(err, ValidateError::IncompleteAncestor { .. }));
}

#[test]
fn ancestor_scope_must_match() {
    let other = Key::with_name(AppNamespace::app("s~shop"), "Person", "bob").unwrap();
    let err = person().ancestor(other).unwrap_err();

    assert_eq!(
        err,
        ValidateError::AncestorScopeMismatch {
            ancestor: AppNamespace::app("s~shop"),
            query: scope(),
        }
    );
    assert_eq!(err.query_type(), IllegalQueryType::IllegalValue);
}

#[test]
fn distinct_promotes_projections_to_group_by() {
    let q = person()
        .project("a")
        .unwrap()
        .project("b")
        .unwrap()
        .group_by("b")
        .distinct(true)
        .with_distinct_promoted();

    assert_eq!(q.group_by, ["b", "a"]);
}

#[test]
fn cursor_websafe_round_trip() {
    let cursor = Cursor::new(vec![0, 0xfb, 0xff, 7]);
    let encoded = cursor.to_websafe();

    assert!(!encoded.contains(['+', '/', '=']));
    assert_eq!(Cursor::from_websafe(&encoded).unwrap(), cursor);
    assert!(Cursor::from_websafe("not base64!").is_err());
}

///
/// NORMALIZE
///

#[test]
fn single_in_becomes_equal() {
    let n = normalize(&person().filter(Filter::in_("a", vec![Value::Int(1)])));

    assert_eq!(n.filters, [Filter::eq("a", 1)]);
}

#[test]
fn multi_in_is_untouched() {
    let q = person().filter(Filter::in_("a", vec![Value::Int(1), Value::Int(2)]));

    assert_eq!(normalize(&q).filters, q.filters);
}

#[test]
fn duplicate_equalities_are_dropped() {
    let q = person()
        .filter(Filter::eq("a", 1))
        .filter(Filter::in_("a", vec![Value::Int(1)]))
        .filter(Filter::eq("a", 2));

    assert_eq!(
        normalize(&q).filters,
        [Filter::eq("a", 1), Filter::eq("a", 2)]
    );
}

#[test]
fn orders_on_equality_properties_are_dropped() {
    let q = person()
        .filter(Filter::eq("a", 1))
        .order(SortOrder::asc("a"))
        .order(SortOrder::desc("b"))
        .order(SortOrder::asc("b"));

    assert_eq!(normalize(&q).sort_orders, [SortOrder::desc("b")]);
}

#[test]
fn equality_and_inequality_on_one_property_keeps_order() {
    let q = person()
        .filter(Filter::eq("a", 1))
        .filter(Filter::gt("a", 0))
        .order(SortOrder::asc("a"));

    assert_eq!(normalize(&q).sort_orders, [SortOrder::asc("a")]);
}

#[test]
fn key_equality_drops_all_orders() {
    let q = person()
        .filter(Filter::eq(KEY_PROPERTY, alice()))
        .order(SortOrder::asc("b"))
        .order(SortOrder::asc(KEY_PROPERTY));

    assert!(normalize(&q).sort_orders.is_empty());
}

#[test]
fn orders_after_key_order_are_truncated() {
    let q = person()
        .order(SortOrder::asc("a"))
        .order(SortOrder::desc(KEY_PROPERTY))
        .order(SortOrder::asc("b"));

    assert_eq!(
        normalize(&q).sort_orders,
        [SortOrder::asc("a"), SortOrder::desc(KEY_PROPERTY)]
    );
}

#[test]
fn covered_exists_filters_are_dropped() {
    let q = person()
        .filter(Filter::exists("a"))
        .filter(Filter::gt("b", 1))
        .filter(Filter::exists("b"))
        .filter(Filter::exists("c"))
        .filter(Filter::exists("c"))
        .order(SortOrder::asc("b"))
        .order(SortOrder::asc("a"));

    assert_eq!(
        normalize(&q).filters,
        [Filter::gt("b", 1), Filter::exists("c")]
    );
}

#[test]
fn exists_injected_for_projection_then_group_by() {
    let q = person()
        .filter(Filter::gt("a", 1))
        .project("c")
        .unwrap()
        .project("a")
        .unwrap()
        .group_by("d");

    assert_eq!(
        normalize(&q).filters,
        [Filter::gt("a", 1), Filter::exists("c"), Filter::exists("d")]
    );
}

#[test]
fn normalize_leaves_input_untouched() {
    let q = person()
        .filter(Filter::in_("a", vec![Value::Int(1)]))
        .project("b")
        .unwrap();
    let before = q.clone();

    let _ = normalize(&q);
    assert_eq!(q, before);
}

///
/// VALIDATE
///

#[test]
fn inequality_with_matching_sort_passes() {
    let q = person()
        .filter(Filter::gt("age", 25))
        .order(SortOrder::asc("age"));

    assert_eq!(check(&q), Ok(()));
}

#[test]
fn first_sort_must_be_inequality_property() {
    let q = person()
        .filter(Filter::gt("age", 25))
        .order(SortOrder::desc("name"))
        .order(SortOrder::asc("age"));

    let err = check(&q).unwrap_err();
    assert_eq!(
        err.query_type(),
        IllegalQueryType::FirstSortNotInequalityProperty
    );
    assert!(
        err.to_string()
            .contains("first sort property must match inequality property")
    );
}

#[test]
fn equality_on_projected_property_is_rejected() {
    let q = person()
        .project("age")
        .unwrap()
        .filter(Filter::eq("age", 30));

    let err = check(&q).unwrap_err();
    assert_eq!(err.query_type(), IllegalQueryType::IllegalProjection);
    assert!(
        err.to_string()
            .contains("cannot project a property with an equality filter")
    );
}

#[test]
fn geo_with_cursor_is_rejected() {
    let q = person()
        .filter(Filter::in_region(
            "location",
            GeoRegion::circle(point(10.0, 20.0), 500.0),
        ))
        .start_cursor(Cursor::new(vec![1, 2, 3]));

    let err = check(&q).unwrap_err();
    assert_eq!(err.query_type(), IllegalQueryType::CursorWithGeoQuery);
    assert!(
        err.to_string()
            .contains("cursors are not supported with geo-spatial queries")
    );
}

#[test]
fn keys_only_with_projection_is_always_illegal_projection() {
    let mut q = person().filter(Filter::gt("age", 1));
    q.keys_only = true;
    q.projections = vec!["name".to_string()];

    for _ in 0..3 {
        assert_eq!(tag(&q), IllegalQueryType::IllegalProjection);
        assert_eq!(tag(&normalize(&q)), IllegalQueryType::IllegalProjection);
    }
}

#[test]
fn duplicate_projection_field_is_illegal_projection() {
    let mut q = person();
    q.projections = vec!["a".to_string(), "a".to_string()];

    assert!(matches!(
        validate(&q),
        Err(ValidateError::DuplicateProjection { .. })
    ));
}

#[test]
fn group_by_rules() {
    let dup = person().group_by("a").group_by("a");
    assert!(matches!(
        validate(&dup),
        Err(ValidateError::DuplicateGroupBy { .. })
    ));

    let reserved = person().group_by("__scatter__");
    assert!(matches!(
        validate(&reserved),
        Err(ValidateError::ReservedGroupBy { .. })
    ));

    let not_prefix = person()
        .group_by("a")
        .order(SortOrder::asc("b"))
        .order(SortOrder::asc("a"));
    assert_eq!(tag(&not_prefix), IllegalQueryType::IllegalGroupBy);

    let prefix = person()
        .group_by("a")
        .order(SortOrder::asc("a"))
        .order(SortOrder::asc("b"));
    assert_eq!(validate(&prefix), Ok(()));
}

#[test]
fn equality_on_group_by_is_rejected() {
    let q = person().group_by("a").filter(Filter::eq("a", 1));

    assert!(matches!(
        validate(&q),
        Err(ValidateError::EqualityOnGroupBy { .. })
    ));
}

#[test]
fn inequality_must_be_grouped() {
    let q = person()
        .group_by("a")
        .order(SortOrder::asc("a"))
        .filter(Filter::gt("b", 1));

    assert!(matches!(
        validate(&q),
        Err(ValidateError::InequalityNotGrouped { property }) if property == "b"
    ));
}

#[test]
fn kindless_query_allows_only_key_filters_and_ascending_key_order() {
    let ok = Query::kindless(scope())
        .filter(Filter::gt(KEY_PROPERTY, alice()))
        .order(SortOrder::asc(KEY_PROPERTY));
    assert_eq!(check(&ok), Ok(()));

    let filter = Query::kindless(scope()).filter(Filter::eq("a", 1));
    assert_eq!(tag(&filter), IllegalQueryType::KindRequired);

    let order = Query::kindless(scope()).order(SortOrder::desc(KEY_PROPERTY));
    assert_eq!(tag(&order), IllegalQueryType::KindRequired);
}

#[test]
fn ancestor_fields_are_revalidated() {
    let mut q = person();
    q.ancestor = Some(Key::with_name(AppNamespace::app("other"), "P", "x").unwrap());

    assert!(matches!(
        validate(&q),
        Err(ValidateError::AncestorScopeMismatch { .. })
    ));
}

#[test]
fn multiple_inequality_properties_are_rejected() {
    let q = person()
        .filter(Filter::gt("a", 1))
        .filter(Filter::lt("a", 5))
        .filter(Filter::lte("b", 2));

    let err = validate(&q).unwrap_err();
    assert_eq!(
        err,
        ValidateError::MultipleInequality {
            first: "a".to_string(),
            second: "b".to_string(),
        }
    );
    assert_eq!(
        err.query_type(),
        IllegalQueryType::MultipleInequalityFilters
    );
}

#[test]
fn composite_filters_are_rejected() {
    let multi = person().filter(Filter::or(vec![Filter::eq("a", 1), Filter::eq("b", 2)]));
    assert_eq!(tag(&multi), IllegalQueryType::MultiPropertyFilter);

    let single = person().filter(Filter::or(vec![Filter::eq("a", 1), Filter::eq("a", 2)]));
    assert_eq!(tag(&single), IllegalQueryType::UnsupportedFilter);
}

#[test]
fn unsupported_operators() {
    let ne = person().filter(Filter::ne("a", 1));
    assert_eq!(tag(&ne), IllegalQueryType::UnsupportedFilter);

    let multi_in = person().filter(Filter::in_("a", vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(tag(&multi_in), IllegalQueryType::UnsupportedFilter);

    let empty_in = person().filter(Filter::in_("a", Vec::new()));
    assert_eq!(tag(&empty_in), IllegalQueryType::IllegalValue);
}

#[test]
fn key_filter_value_must_be_key_in_scope() {
    let not_key = person().filter(Filter::eq(KEY_PROPERTY, 7));
    assert_eq!(validate(&not_key), Err(ValidateError::KeyFilterNotKey));

    let foreign = Key::with_name(AppNamespace::app("s~shop"), "Person", "x").unwrap();
    let wrong_scope = person().filter(Filter::gt(KEY_PROPERTY, foreign));
    assert_eq!(tag(&wrong_scope), IllegalQueryType::IllegalValue);
}

#[test]
fn geo_region_shape_rules() {
    let point_operand = person().filter(Filter::eq("loc", point(1.0, 2.0)));
    assert_eq!(check(&point_operand), Ok(()));

    let wrong_operand = person().filter(Filter::Property(FilterPredicate::new(
        "loc",
        FilterOperator::ContainedInRegion,
        FilterOperand::Value(point(1.0, 2.0).into()),
    )));
    assert!(matches!(
        validate(&wrong_operand),
        Err(ValidateError::GeoNeedsRegion { .. })
    ));

    let both = GeoRegion {
        circle: GeoRegion::circle(point(0.0, 0.0), 1.0).circle,
        rectangle: GeoRegion::rectangle(point(0.0, 0.0), point(1.0, 1.0)).rectangle,
    };
    let two_shapes = person().filter(Filter::in_region("loc", both));
    assert_eq!(tag(&two_shapes), IllegalQueryType::UnsupportedFilter);

    let no_shape = person().filter(Filter::in_region("loc", GeoRegion::default()));
    assert_eq!(tag(&no_shape), IllegalQueryType::UnsupportedFilter);
}

#[test]
fn geo_compatibility() {
    let region = GeoRegion::rectangle(point(0.0, 0.0), point(1.0, 1.0));

    let with_inequality = person()
        .filter(Filter::in_region("loc", region))
        .filter(Filter::gt("a", 1));
    assert_eq!(
        validate(&with_inequality),
        Err(ValidateError::GeoWithInequality)
    );

    let with_ancestor = person()
        .ancestor(alice())
        .unwrap()
        .filter(Filter::in_region("loc", region));
    assert_eq!(validate(&with_ancestor), Err(ValidateError::GeoWithAncestor));

    let plain = person()
        .filter(Filter::in_region("loc", region))
        .filter(Filter::eq("a", 1));
    assert_eq!(check(&plain), Ok(()));
}

#[test]
fn missing_operand_is_illegal_value() {
    let q = person().filter(Filter::Property(FilterPredicate::new(
        "a",
        FilterOperator::LessThan,
        FilterOperand::None,
    )));

    assert_eq!(tag(&q), IllegalQueryType::IllegalValue);
}

///
/// WIRE
///

fn prepared_legacy(query: &Query) -> legacy::Query {
    match prepare(query, Protocol::Legacy, &context()).unwrap() {
        PreparedQuery::Legacy(q) => q,
        PreparedQuery::Public(_) => panic!("expected legacy query"),
    }
}

fn prepared_public(query: &Query) -> public::Query {
    match prepare(query, Protocol::Public, &context()).unwrap() {
        PreparedQuery::Public(request) => {
            assert_eq!(request.project_id, "shop");
            let partition = request.partition_id.unwrap();
            assert_eq!(partition.namespace_id, "ns");
            request.query.unwrap()
        }
        PreparedQuery::Legacy(_) => panic!("expected public request"),
    }
}

fn property_filter(filter: &public::Filter) -> &public::PropertyFilter {
    match filter.filter_type.as_ref() {
        Some(public::filter::FilterType::PropertyFilter(p)) => p,
        other => panic!("expected property filter, got {other:?}"),
    }
}

#[test]
fn legacy_query_carries_typed_filters_and_orders() {
    let q = person()
        .filter(Filter::gt("age", 25))
        .filter(Filter::eq("city", "Oslo"))
        .order(SortOrder::asc("age"))
        .order(SortOrder::desc("name"))
        .start_cursor(Cursor::new(vec![9]))
        .offset(2)
        .limit(10);

    let wire = prepared_legacy(&q);
    assert_eq!(wire.app, "s~shop");
    assert_eq!(wire.name_space.as_deref(), Some("ns"));
    assert_eq!(wire.kind.as_deref(), Some("Person"));
    assert_eq!(wire.filter.len(), 2);

    let age = &wire.filter[0];
    assert_eq!(age.op, legacy::FilterOp::GreaterThan as i32);
    assert_eq!(age.property[0].name, "age");
    assert_eq!(
        age.property[0].value.as_ref().unwrap().int64_value,
        Some(25)
    );

    let city = &wire.filter[1];
    assert_eq!(city.op, legacy::FilterOp::Equal as i32);
    assert_eq!(
        city.property[0].value.as_ref().unwrap().string_value.as_deref(),
        Some(b"Oslo".as_slice())
    );

    assert_eq!(wire.order.len(), 2);
    assert_eq!(wire.order[1].direction, legacy::Direction::Descending as i32);
    assert_eq!(wire.compiled_cursor.as_deref(), Some([9].as_slice()));
    assert_eq!(wire.offset, Some(2));
    assert_eq!(wire.limit, Some(10));
}

#[test]
fn legacy_distinct_projection_query() {
    let q = person()
        .filter(Filter::gt("age", 20))
        .order(SortOrder::asc("age"))
        .project("age")
        .unwrap()
        .project("name")
        .unwrap()
        .distinct(true);

    let wire = prepared_legacy(&q);
    assert!(wire.distinct);
    assert_eq!(wire.property_name, ["age", "name"]);
    assert_eq!(wire.group_by_property_name, ["age", "name"]);

    let exists = &wire.filter[1];
    assert_eq!(exists.op, legacy::FilterOp::Exists as i32);
    assert_eq!(exists.property[0].name, "name");
    assert_eq!(
        exists.property[0].value,
        Some(legacy::PropertyValue::default())
    );
}

#[test]
fn legacy_geo_and_ancestor() {
    let region = GeoRegion::circle(point(10.0, 20.0), 250.0);
    let geo = prepared_legacy(&person().filter(Filter::in_region("loc", region)));
    let circle = geo.filter[0]
        .geo_region
        .as_ref()
        .and_then(|r| r.circle.as_ref())
        .unwrap();
    assert_eq!(circle.radius_meters, 250.0);
    assert_eq!(circle.center.as_ref().unwrap().latitude, 10.0);

    let rooted = prepared_legacy(&person().ancestor(alice()).unwrap().keys_only().unwrap());
    assert!(rooted.keys_only);
    assert_eq!(rooted.ancestor.unwrap().app, "s~shop");
}

#[test]
fn public_request_shape() {
    let q = person()
        .ancestor(alice())
        .unwrap()
        .filter(Filter::gt("age", 25))
        .filter(Filter::exists("nickname"))
        .order(SortOrder::asc("age"))
        .keys_only()
        .unwrap()
        .limit(5);

    let wire = prepared_public(&q);
    assert_eq!(wire.kind[0].name, "Person");
    assert_eq!(
        wire.projection[0].property.as_ref().unwrap().name,
        KEY_PROPERTY
    );
    assert_eq!(wire.limit, Some(5));
    assert_eq!(wire.offset, 0);

    let Some(public::filter::FilterType::CompositeFilter(and)) =
        wire.filter.unwrap().filter_type
    else {
        panic!("expected composite filter");
    };
    assert_eq!(and.op, public::CompositeOperator::And as i32);
    assert_eq!(and.filters.len(), 2);

    let ancestor = property_filter(&and.filters[0]);
    assert_eq!(ancestor.op, public::PropertyOperator::HasAncestor as i32);
    assert!(matches!(
        ancestor.value.as_ref().unwrap().value_type,
        Some(public::value::ValueType::KeyValue(_))
    ));

    let age = property_filter(&and.filters[1]);
    assert_eq!(age.op, public::PropertyOperator::GreaterThan as i32);
    assert_eq!(
        age.value.as_ref().unwrap().value_type,
        Some(public::value::ValueType::IntegerValue(25))
    );
}

#[test]
fn public_distinct_on_and_single_filter() {
    let q = person()
        .filter(Filter::gt("age", 20))
        .order(SortOrder::asc("age"))
        .project("age")
        .unwrap()
        .project("name")
        .unwrap()
        .distinct(true);

    let wire = prepared_public(&q);
    let names: Vec<_> = wire.distinct_on.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["age", "name"]);
    assert_eq!(wire.projection.len(), 2);

    // the injected exists filter is implied by the projection
    let filter = wire.filter.unwrap();
    assert_eq!(property_filter(&filter).op, public::PropertyOperator::GreaterThan as i32);
}

#[test]
fn public_rejects_geo() {
    let q = person().filter(Filter::in_region(
        "loc",
        GeoRegion::circle(point(0.0, 0.0), 1.0),
    ));

    let err = prepare(&q, Protocol::Public, &context()).unwrap_err();
    assert!(matches!(err, PrepareError::GeoUnsupported { property } if property == "loc"));
}

#[test]
fn prepare_validates_before_building() {
    let q = person().filter(Filter::ne("a", 1));

    for protocol in [Protocol::Legacy, Protocol::Public] {
        let err = prepare(&q, protocol, &context()).unwrap_err();
        assert!(matches!(
            err,
            PrepareError::Invalid(ValidateError::UnsupportedOperator { .. })
        ));
    }
}

#[test]
fn public_unknown_app_is_translate_error() {
    let q = Query::new(AppNamespace::app("e~elsewhere"), "Person");

    let err = prepare(&q, Protocol::Public, &context()).unwrap_err();
    assert!(matches!(err, PrepareError::Translate(TranslateError::Context(_))));
}

///
/// PROPERTIES
///

const PROPS: [&str; 4] = ["a", "b", "c", KEY_PROPERTY];

fn arb_filter() -> impl Strategy<Value = Filter> {
    (0..PROPS.len(), 0..6u8, 0..3i64, 0..3i64).prop_map(|(p, op, v, n)| {
        let property = PROPS[p];
        match op {
            0 => Filter::eq(property, v),
            1 => Filter::lt(property, v),
            2 => Filter::gte(property, v),
            3 => Filter::ne(property, v),
            4 => Filter::in_(property, (0..n).map(|i| Value::Int(v + i)).collect()),
            _ => Filter::exists(property),
        }
    })
}

fn arb_order() -> impl Strategy<Value = SortOrder> {
    (0..PROPS.len(), any::<bool>()).prop_map(|(p, asc)| {
        if asc {
            SortOrder::asc(PROPS[p])
        } else {
            SortOrder::desc(PROPS[p])
        }
    })
}

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(0..3usize, 0..3).prop_map(|idx| {
        let mut names: Vec<String> = Vec::new();
        for i in idx {
            let name = PROPS[i].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    })
}

fn arb_query() -> impl Strategy<Value = Query> {
    (
        prop::collection::vec(arb_filter(), 0..6),
        prop::collection::vec(arb_order(), 0..4),
        arb_names(),
        arb_names(),
    )
        .prop_map(|(filters, orders, projections, group_by)| {
            let mut q = person();
            q.filters = filters;
            q.sort_orders = orders;
            q.projections = projections;
            q.group_by = group_by;
            q
        })
}

proptest! {
    #[test]
    fn normalize_is_idempotent(q in arb_query()) {
        let once = normalize(&q);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn validation_is_deterministic(q in arb_query()) {
        let n = normalize(&q);
        prop_assert_eq!(validate(&n), validate(&n));
    }
}
