//! Time-stamped nodal field snapshots stored on elements.
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named nodal fields an element keeps snapshots of.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Geometry,
    Displacement,
    Multiplier,
    Normal,
    Tangent,
}

/// Values ordered by analysis time.
///
/// Inserting at a time that is already present overwrites that snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<V> {
    snapshots: Vec<(f64, V)>,
}

impl<V> Default for TimeSeries<V> {
    fn default() -> Self {
        Self { snapshots: Vec::new() }
    }
}

impl<V> TimeSeries<V> {
    pub fn insert(&mut self, time: f64, value: V) {
        let idx = self.snapshots.partition_point(|(t, _)| *t < time);
        match self.snapshots.get_mut(idx) {
            Some((t, existing)) if *t == time => *existing = value,
            _ => self.snapshots.insert(idx, (time, value)),
        }
    }

    /// The most recent snapshot at or before `time`.
    pub fn at(&self, time: f64) -> Option<&V> {
        let idx = self.snapshots.partition_point(|(t, _)| *t <= time);
        idx.checked_sub(1).map(|i| &self.snapshots[i].1)
    }

    pub fn latest(&self) -> Option<(f64, &V)> {
        self.snapshots.last().map(|(t, v)| (*t, v))
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.snapshots.iter().map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// One vector per element node, in connectivity order.
pub type NodalValues = Vec<Vector2<f64>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStore {
    fields: BTreeMap<Field, TimeSeries<NodalValues>>,
}

impl FieldStore {
    pub fn insert(&mut self, field: Field, time: f64, values: NodalValues) {
        self.fields.entry(field).or_default().insert(time, values);
    }

    pub fn at(&self, field: Field, time: f64) -> Option<&[Vector2<f64>]> {
        self.fields
            .get(&field)
            .and_then(|series| series.at(time))
            .map(|values| values.as_slice())
    }

    pub fn series(&self, field: Field) -> Option<&TimeSeries<NodalValues>> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }
}
