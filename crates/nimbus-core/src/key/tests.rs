use super::*;
use proptest::prelude::*;

fn scope() -> AppNamespace {
    AppNamespace::app("s~app")
}

fn named(kind: &str, name: &str) -> Key {
    Key::with_name(scope(), kind, name).unwrap()
}

fn numbered(kind: &str, id: i64) -> Key {
    Key::with_id(scope(), kind, id).unwrap()
}

#[test]
fn construction_rejects_invalid_parts() {
    assert_eq!(Key::with_name(scope(), "", "a"), Err(KeyError::EmptyKind));
    assert_eq!(Key::with_name(scope(), "K", ""), Err(KeyError::EmptyName));
    assert_eq!(Key::with_id(scope(), "K", 0), Err(KeyError::ZeroId));
}

#[test]
fn child_of_incomplete_parent_is_rejected() {
    let parent = Key::incomplete(scope(), "Parent").unwrap();

    assert!(matches!(
        parent.child_with_id("Child", 1),
        Err(KeyError::IncompleteParent { .. })
    ));
}

#[test]
fn child_scope_must_match_parent() {
    let parent = named("Parent", "p");
    let err = Key::from_parts(
        scope().with_namespace("other"),
        Some(parent),
        "Child",
        KeyId::Id(3),
    )
    .unwrap_err();

    assert!(matches!(err, KeyError::NamespaceMismatch { .. }));
}

#[test]
fn completeness_follows_id_or_name() {
    assert!(named("K", "a").is_complete());
    assert!(numbered("K", 7).is_complete());
    assert!(!Key::incomplete(scope(), "K").unwrap().is_complete());
}

#[test]
fn complete_with_id_assigns_once() {
    let key = Key::incomplete(scope(), "K").unwrap();
    let assigned = key.complete_with_id(42).unwrap();

    assert_eq!(assigned.id(), Some(42));
    assert!(matches!(
        assigned.complete_with_id(43),
        Err(KeyError::AlreadyComplete { .. })
    ));
}

#[test]
fn ancestor_sorts_before_descendant() {
    let parent = named("Person", "alice");
    let child = parent.child_with_id("Pet", 1).unwrap();
    let grandchild = child.child_with_name("Toy", "ball").unwrap();

    assert!(parent < child);
    assert!(child < grandchild);
    assert!(parent.is_ancestor_of(&grandchild));
    assert!(!child.is_ancestor_of(&parent));
}

#[test]
fn siblings_with_ids_compare_by_id() {
    let parent = named("Person", "alice");
    let a = parent.child_with_id("Pet", 2).unwrap();
    let b = parent.child_with_id("Pet", 10).unwrap();

    assert!(a < b);
}

#[test]
fn id_sorts_before_name_at_same_position() {
    assert!(numbered("K", i64::MAX) < named("K", "a"));
}

#[test]
fn incomplete_sorts_before_id_and_is_construction_ordered() {
    let first = Key::incomplete(scope(), "K").unwrap();
    let second = Key::incomplete(scope(), "K").unwrap();

    assert!(first < numbered("K", 1));
    assert!(first < second);
    assert_ne!(first, second);
    assert_eq!(first, first.clone());
}

#[test]
fn namespace_then_kind_ordering() {
    let a = Key::with_name(AppNamespace::new("s~app", "a"), "Z", "x").unwrap();
    let b = Key::with_name(AppNamespace::new("s~app", "b"), "A", "x").unwrap();
    assert!(a < b);

    assert!(named("A", "z") < named("B", "a"));
}

#[test]
fn display_renders_path() {
    let key = named("Person", "alice").child_with_id("Pet", 5).unwrap();

    assert_eq!(key.to_string(), "Person(\"alice\")/Pet(5)");
}

#[test]
fn websafe_round_trip() {
    let key = Key::with_name(AppNamespace::new("s~app", "ns"), "Person", "alice")
        .unwrap()
        .child_with_id("Pet", 99)
        .unwrap();

    let encoded = key.to_websafe().unwrap();
    assert!(!encoded.contains('+') && !encoded.contains('/'));
    assert_eq!(Key::from_websafe(&encoded).unwrap(), key);
}

#[test]
fn websafe_rejects_incomplete_and_garbage() {
    let key = Key::incomplete(scope(), "K").unwrap();
    assert!(matches!(key.to_websafe(), Err(KeyError::Incomplete { .. })));
    assert!(matches!(
        Key::from_websafe("!!!"),
        Err(KeyError::InvalidEncoding(_))
    ));
}

fn arb_element() -> impl Strategy<Value = KeyId> {
    prop_oneof![
        (1i64..1_000).prop_map(KeyId::Id),
        "[a-c]{1,3}".prop_map(KeyId::Name),
    ]
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop::collection::vec(("[A-C]", arb_element()), 1..4).prop_map(|elements| {
        let mut key: Option<Key> = None;
        for (kind, id) in elements {
            key = Some(Key::from_parts(scope(), key, kind, id).unwrap());
        }
        key.unwrap()
    })
}

proptest! {
    #[test]
    fn ordering_is_total_and_antisymmetric(a in arb_key(), b in arb_key()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
    }

    #[test]
    fn strict_ancestor_is_always_smaller(key in arb_key()) {
        let mut current = key.parent();
        while let Some(ancestor) = current {
            prop_assert!(ancestor < &key);
            current = ancestor.parent();
        }
    }
}
