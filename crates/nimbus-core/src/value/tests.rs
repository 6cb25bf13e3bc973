use super::*;
use crate::context::AppNamespace;
use nimbus_proto::meaning;
use proptest::prelude::*;

#[test]
fn meaning_lookup_inverts_type_meaning() {
    for ty in [
        ValueType::Text,
        ValueType::ShortBlob,
        ValueType::Blob,
        ValueType::DateTime,
        ValueType::GeoPt,
        ValueType::Entity,
        ValueType::Link,
        ValueType::Category,
        ValueType::Email,
        ValueType::PostalAddress,
        ValueType::PhoneNumber,
        ValueType::ImHandle,
        ValueType::Rating,
        ValueType::BlobKey,
        ValueType::Raw,
    ] {
        assert_eq!(ValueType::for_meaning(ty.meaning()), Some(ty), "{ty}");
    }

    assert_eq!(ValueType::for_meaning(meaning::EMPTY_LIST), None);
    assert_eq!(ValueType::for_meaning(meaning::ATOM_TITLE), None);
}

#[test]
fn probe_order_types_carry_no_meaning() {
    for ty in ValueType::MEANINGLESS_PROBE_ORDER {
        assert_eq!(ty.meaning(), meaning::NO_MEANING);
    }
    assert_eq!(ValueType::MEANINGLESS_PROBE_ORDER[0], ValueType::Int);
    assert_eq!(ValueType::MEANINGLESS_PROBE_ORDER[1], ValueType::Double);
}

#[test]
fn unindexable_types() {
    assert!(!Value::Text(Text::new("long")).is_indexable());
    assert!(!Value::Blob(Blob::new(vec![1])).is_indexable());
    assert!(Value::ShortBlob(ShortBlob::new(vec![1])).is_indexable());
    assert!(Value::from("s").is_indexable());
}

#[test]
fn long_strings_are_rejected() {
    let at_limit = Value::String("a".repeat(MAX_INDEXED_BYTES));
    let over = Value::String("a".repeat(MAX_INDEXED_BYTES + 1));
    let long_blob = Value::ShortBlob(ShortBlob::new(vec![0; MAX_INDEXED_BYTES + 1]));

    assert!(at_limit.check_supported().is_ok());
    assert!(matches!(
        over.check_supported(),
        Err(DataTypeError::TooLong {
            value_type: ValueType::String,
            ..
        })
    ));
    assert!(long_blob.check_supported().is_err());
    assert!(Value::Text(Text::new("a".repeat(5000))).check_supported().is_ok());
}

#[test]
fn rating_and_geo_ranges() {
    assert!(Rating::new(0).is_ok());
    assert!(Rating::new(100).is_ok());
    assert_eq!(Rating::new(101), Err(DataTypeError::RatingOutOfRange(101)));
    assert_eq!(Rating::new(-1), Err(DataTypeError::RatingOutOfRange(-1)));

    assert!(GeoPt::new(90.0, -180.0).is_ok());
    assert!(matches!(
        GeoPt::new(90.5, 0.0),
        Err(DataTypeError::LatitudeOutOfRange(_))
    ));
    assert!(matches!(
        GeoPt::new(0.0, 181.0),
        Err(DataTypeError::LongitudeOutOfRange(_))
    ));
}

#[test]
fn datetime_range_boundaries() {
    assert!(DateTime::from_micros(MIN_TIMESTAMP_MICROS).is_rfc3339_representable());
    assert!(DateTime::from_micros(MAX_TIMESTAMP_MICROS).is_rfc3339_representable());
    assert!(!DateTime::from_micros(MIN_TIMESTAMP_MICROS - 1).is_rfc3339_representable());
    assert!(!DateTime::from_micros(MAX_TIMESTAMP_MICROS + 1).is_rfc3339_representable());

    assert_eq!(
        DateTime::from_micros(MAX_TIMESTAMP_MICROS).to_rfc3339().as_deref(),
        Some("9999-12-31T23:59:59.999999Z")
    );
    assert_eq!(
        DateTime::from_micros(MIN_TIMESTAMP_MICROS).to_rfc3339().as_deref(),
        Some("0001-01-01T00:00:00.000000Z")
    );
    assert_eq!(DateTime::from_micros(i64::MAX).to_rfc3339(), None);
}

#[test]
fn datetime_seconds_nanos_handles_negative_micros() {
    let dt = DateTime::from_micros(-1);
    let (seconds, nanos) = dt.to_seconds_nanos();

    assert_eq!((seconds, nanos), (-1, 999_999_000));
    assert_eq!(DateTime::from_seconds_nanos(seconds, nanos), Some(dt));
}

#[test]
fn datetime_parses_rfc3339() {
    let dt = DateTime::parse_rfc3339("1970-01-01T00:00:01.5Z").unwrap();

    assert_eq!(dt.micros(), 1_500_000);
    assert!(DateTime::parse_rfc3339("yesterday").is_err());
}

#[test]
fn comparable_rank_order() {
    let key = Key::with_id(AppNamespace::app("a"), "K", 1).unwrap();
    let ranked = [
        Value::Null,
        Value::Int(i64::MAX),
        Value::Bool(false),
        Value::from("a"),
        Value::Double(f64::MIN),
        Value::GeoPt(GeoPt::new(0.0, 0.0).unwrap()),
        Value::User(User::new("a@b.c", "b.c")),
        Value::Key(key),
    ];

    let comparables: Vec<_> = ranked.iter().map(|v| as_comparable(v).unwrap()).collect();
    for pair in comparables.windows(2) {
        assert!(pair[0] < pair[1], "{:?} < {:?}", pair[0], pair[1]);
    }
}

#[test]
fn int_like_types_share_rank() {
    let dt = as_comparable(&Value::DateTime(DateTime::from_micros(5))).unwrap();
    let rating = as_comparable(&Value::Rating(Rating::new(5).unwrap())).unwrap();

    assert_eq!(dt, Comparable::Int(5));
    assert_eq!(rating, Comparable::Int(5));
}

#[test]
fn bytes_compare_unsigned() {
    // U+00E9 encodes as 0xC3 0xA9, above every ASCII byte.
    let ascii = as_comparable(&Value::from("z")).unwrap();
    let accented = as_comparable(&Value::from("é")).unwrap();
    let blob = as_comparable(&Value::ShortBlob(ShortBlob::new(vec![0xff]))).unwrap();

    assert!(ascii < accented);
    assert!(accented < blob);
}

#[test]
fn unindexable_values_have_no_comparable() {
    assert!(as_comparable(&Value::Text(Text::new("t"))).is_none());
    assert!(as_comparable(&Value::Blob(Blob::new(vec![]))).is_none());
}

#[test]
fn raw_value_reinterprets_scalar() {
    let raw = RawValue::new(Comparable::Int(42));

    assert_eq!(raw.value(), Value::Int(42));
    assert_eq!(
        raw.as_type(ValueType::DateTime),
        Some(Value::DateTime(DateTime::from_micros(42)))
    );
    assert_eq!(
        raw.as_type(ValueType::Rating),
        Some(Value::Rating(Rating::new(42).unwrap()))
    );
    assert_eq!(raw.as_type(ValueType::String), None);

    let bytes = RawValue::new(Comparable::bytes("xmpp me@host"));
    assert_eq!(
        bytes.as_type(ValueType::ImHandle),
        Some(Value::ImHandle(ImHandle::new("xmpp", "me@host")))
    );
    assert_eq!(bytes.value(), Value::from("xmpp me@host"));

    let null = RawValue::new(Comparable::Null);
    assert_eq!(null.as_type(ValueType::Email), Some(Value::Null));
}

#[test]
fn raw_bytes_fall_back_to_short_blob() {
    let raw = RawValue::new(Comparable::bytes(vec![0xff, 0xfe]));

    assert_eq!(raw.value(), Value::ShortBlob(ShortBlob::new(vec![0xff, 0xfe])));
    assert_eq!(raw.as_type(ValueType::String), None);
}

#[test]
fn option_converts_to_null() {
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some(3i64)), Value::Int(3));
}

proptest! {
    #[test]
    fn string_comparable_matches_byte_order(a in ".{0,8}", b in ".{0,8}") {
        let ca = as_comparable(&Value::String(a.clone())).unwrap();
        let cb = as_comparable(&Value::String(b.clone())).unwrap();

        prop_assert_eq!(ca.cmp(&cb), a.as_bytes().cmp(b.as_bytes()));
    }

    #[test]
    fn int_comparable_matches_numeric_order(a: i64, b: i64) {
        let ca = as_comparable(&Value::Int(a)).unwrap();
        let cb = as_comparable(&Value::Int(b)).unwrap();

        prop_assert_eq!(ca.cmp(&cb), a.cmp(&b));
    }
}
