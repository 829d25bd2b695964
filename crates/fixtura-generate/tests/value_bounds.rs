use proptest::prelude::*;

use fixtura_core::{Attribute, AttributeDefinition, EntityType, Value, ValueKind};
use fixtura_generate::settings::{GLOBAL_MAX, GLOBAL_MIN};
use fixtura_generate::{Generated, GeneratorSettings, ResolvedForeignKeys, ValueGenerator};

fn numeric_kind() -> impl Strategy<Value = ValueKind> {
    prop_oneof![
        Just(ValueKind::Short),
        Just(ValueKind::Integer),
        Just(ValueKind::Long),
        Just(ValueKind::Double),
        Just(ValueKind::Decimal),
    ]
}

fn generate(seed: u64, column: &AttributeDefinition) -> Result<Generated, String> {
    let mut generator = ValueGenerator::seeded(GeneratorSettings::default(), seed);
    generator
        .generate(
            &EntityType::new("InvoiceLine"),
            Attribute::Column(column),
            &ResolvedForeignKeys::new(),
        )
        .map_err(|err| err.to_string())
}

proptest! {
    #[test]
    fn numeric_values_stay_within_effective_bounds(
        seed in any::<u64>(),
        kind in numeric_kind(),
        minimum in proptest::option::of(-50_000.0f64..50_000.0),
        span in proptest::option::of(0.0f64..100_000.0),
    ) {
        let maximum = match (minimum, span) {
            (Some(minimum), Some(span)) => Some(minimum + span),
            (None, Some(span)) => Some(span - 50_000.0),
            _ => None,
        };
        let column = AttributeDefinition::new("quantity", kind).with_bounds(minimum, maximum);
        let effective_min = minimum.unwrap_or(GLOBAL_MIN).max(GLOBAL_MIN);
        let effective_max = maximum.unwrap_or(GLOBAL_MAX).min(GLOBAL_MAX);

        match generate(seed, &column) {
            Ok(Generated::Value(value)) => {
                let value = value.as_f64().expect("numeric value");
                prop_assert!(value >= effective_min - 1e-9, "{value} < {effective_min}");
                prop_assert!(value <= effective_max + 1e-9, "{value} > {effective_max}");
                prop_assert!(effective_min >= GLOBAL_MIN && effective_max <= GLOBAL_MAX);
            }
            Ok(other) => prop_assert!(false, "unexpected outcome {other:?}"),
            // Narrow or fenced-off ranges may hold no representable value.
            Err(message) => prop_assert!(message.contains("effective range"), "{message}"),
        }
    }

    #[test]
    fn strings_honor_declared_length(seed in any::<u64>(), length in 0i32..64) {
        let column = AttributeDefinition::new("name", ValueKind::String).with_maximum_length(length);
        match generate(seed, &column) {
            Ok(Generated::Value(Value::Text(text))) => prop_assert_eq!(text.len(), length as usize),
            other => prop_assert!(false, "unexpected outcome {other:?}"),
        }
    }
}

#[test]
fn declared_range_beyond_the_fence_is_clamped() {
    let column = AttributeDefinition::new("quantity", ValueKind::Integer)
        .with_bounds(Some(3.0), Some(50_000.0));
    for seed in 0..200 {
        match generate(seed, &column) {
            Ok(Generated::Value(Value::Integer(value))) => assert!((3..=10_000).contains(&value)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

#[test]
fn string_length_defaults_to_ten() {
    let column = AttributeDefinition::new("name", ValueKind::String);
    match generate(1, &column) {
        Ok(Generated::Value(Value::Text(text))) => assert_eq!(text.len(), 10),
        other => panic!("unexpected outcome {other:?}"),
    }
    let column = column.with_maximum_length(5);
    match generate(1, &column) {
        Ok(Generated::Value(Value::Text(text))) => assert_eq!(text.len(), 5),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn infinite_fence_fails_instead_of_panicking() {
    let settings = GeneratorSettings {
        global_min: f64::NEG_INFINITY,
        ..GeneratorSettings::default()
    };
    let mut generator = ValueGenerator::seeded(settings, 3);
    for kind in [ValueKind::Double, ValueKind::Decimal] {
        let column = AttributeDefinition::new("weight", kind);
        let err = generator
            .generate(
                &EntityType::new("Parcel"),
                Attribute::Column(&column),
                &ResolvedForeignKeys::new(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("effective range"), "{err}");
    }

    let column = AttributeDefinition::new("weight", ValueKind::Double).with_bounds(Some(0.0), None);
    assert!(matches!(
        generator.generate(
            &EntityType::new("Parcel"),
            Attribute::Column(&column),
            &ResolvedForeignKeys::new(),
        ),
        Ok(Generated::Value(Value::Double(_)))
    ));
}
