use mortar::fields::{Field, FieldStore, TimeSeries};
use nalgebra::Vector2;

#[test]
fn time_series_returns_latest_snapshot_not_after_time() {
    let mut series = TimeSeries::default();
    series.insert(1.0, "b");
    series.insert(0.0, "a");
    series.insert(2.5, "c");

    assert_eq!(series.at(-0.5), None);
    assert_eq!(series.at(0.0), Some(&"a"));
    assert_eq!(series.at(0.7), Some(&"a"));
    assert_eq!(series.at(1.0), Some(&"b"));
    assert_eq!(series.at(10.0), Some(&"c"));
    assert_eq!(series.latest(), Some((2.5, &"c")));
    assert_eq!(series.times().collect::<Vec<_>>(), vec![0.0, 1.0, 2.5]);
}

#[test]
fn inserting_at_existing_time_overwrites() {
    let mut series = TimeSeries::default();
    series.insert(1.0, 1);
    series.insert(1.0, 2);
    assert_eq!(series.len(), 1);
    assert_eq!(series.at(1.0), Some(&2));
}

#[test]
fn field_store_keeps_fields_apart() {
    let mut store = FieldStore::default();
    store.insert(Field::Displacement, 0.0, vec![Vector2::new(1.0, 0.0)]);
    store.insert(Field::Multiplier, 0.0, vec![Vector2::new(0.0, 2.0)]);

    assert!(store.contains(Field::Displacement));
    assert!(!store.contains(Field::Normal));
    assert_eq!(store.at(Field::Multiplier, 0.5), Some(&[Vector2::new(0.0, 2.0)][..]));
    assert_eq!(store.at(Field::Displacement, -1.0), None);
    assert_eq!(store.series(Field::Displacement).map(|s| s.len()), Some(1));
}
