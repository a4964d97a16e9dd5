//! Per-key time-series storage.
//!
//! A [`FieldStore`] owns one field's ordered `(timestamp, value)` series.
//! Inserts keep the timestamps strictly increasing; a write that repeats
//! the neighboring stored value is absorbed instead of creating a
//! redundant entry, which makes repeated samples run-length compressed.

use serde::{Deserialize, Serialize};

use crate::value::{LoggableType, Value};

/// An ordered set of samples read from a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet<T> {
    pub timestamps: Vec<f64>,
    pub values: Vec<T>,
}

impl<T> ValueSet<T> {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

impl<T> Default for ValueSet<T> {
    fn default() -> Self {
        ValueSet {
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }
}

/// A single field's time-indexed data.
#[derive(Debug, Clone)]
pub struct FieldStore {
    field_type: LoggableType,
    timestamps: Vec<f64>,
    values: Vec<Value>,
}

impl FieldStore {
    pub fn new(field_type: LoggableType) -> Self {
        FieldStore {
            field_type,
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the constant field type.
    pub fn field_type(&self) -> LoggableType {
        self.field_type
    }

    /// Returns the full set of ordered timestamps.
    pub fn get_timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Inserts a value at the sorted position for its timestamp.
    ///
    /// Writes of a mismatched type are dropped. A write at an existing
    /// timestamp replaces that entry's value. Otherwise the dedup rule
    /// applies: equal to the preceding value is a no-op, equal to the
    /// following value advances that entry's timestamp, anything else is
    /// spliced in as a new entry.
    pub fn put(&mut self, timestamp: f64, value: Value) {
        if value.loggable_type() != self.field_type {
            return;
        }

        // Appends dominate during decode, so check the tail first.
        let insert_index = if self
            .timestamps
            .last()
            .is_some_and(|&last| timestamp > last)
        {
            self.timestamps.len()
        } else {
            let index = self.timestamps.partition_point(|&t| t < timestamp);
            if index < self.timestamps.len() && self.timestamps[index] == timestamp {
                self.values[index] = value;
                return;
            }
            index
        };

        if insert_index > 0 && self.values[insert_index - 1] == value {
            // Same as the previous value, already represented.
        } else if insert_index < self.values.len() && self.values[insert_index] == value {
            // Same as the next value, keep the most recent timestamp.
            self.timestamps[insert_index] = timestamp;
        } else {
            self.timestamps.insert(insert_index, timestamp);
            self.values.insert(insert_index, value);
        }
    }

    /// Returns the samples overlapping `[start, end]` with step semantics:
    /// the set is extended to the last sample at or before `start` (the
    /// value still held when the window opens) and trimmed before the
    /// first sample past `end`. A window that falls entirely between two
    /// samples yields the single bracketing sample.
    pub fn get_range(&self, start: f64, end: f64) -> ValueSet<Value> {
        let len = self.timestamps.len();
        if len == 0 {
            return ValueSet::default();
        }

        let start_index = match self.timestamps.partition_point(|&t| t <= start) {
            0 => 0,
            p => p - 1,
        };
        let past_end = self.timestamps.partition_point(|&t| t <= end);
        let end_index = past_end.max(start_index + 1).min(len);

        ValueSet {
            timestamps: self.timestamps[start_index..end_index].to_vec(),
            values: self.values[start_index..end_index].to_vec(),
        }
    }

    /// Reads a set of Raw values, or `None` if the type does not match.
    pub fn get_raw(&self, start: f64, end: f64) -> Option<ValueSet<Vec<u8>>> {
        self.get_typed(start, end, |value| match value {
            Value::Raw(bytes) => Some(bytes),
            _ => None,
        })
    }

    /// Reads a set of Boolean values, or `None` if the type does not match.
    pub fn get_boolean(&self, start: f64, end: f64) -> Option<ValueSet<bool>> {
        self.get_typed(start, end, |value| match value {
            Value::Boolean(b) => Some(b),
            _ => None,
        })
    }

    /// Reads a set of Number values, or `None` if the type does not match.
    pub fn get_number(&self, start: f64, end: f64) -> Option<ValueSet<f64>> {
        self.get_typed(start, end, |value| match value {
            Value::Number(n) => Some(n),
            _ => None,
        })
    }

    /// Reads a set of String values, or `None` if the type does not match.
    pub fn get_string(&self, start: f64, end: f64) -> Option<ValueSet<String>> {
        self.get_typed(start, end, |value| match value {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Reads a set of BooleanArray values, or `None` if the type does not match.
    pub fn get_boolean_array(&self, start: f64, end: f64) -> Option<ValueSet<Vec<bool>>> {
        self.get_typed(start, end, |value| match value {
            Value::BooleanArray(array) => Some(array),
            _ => None,
        })
    }

    /// Reads a set of NumberArray values, or `None` if the type does not match.
    pub fn get_number_array(&self, start: f64, end: f64) -> Option<ValueSet<Vec<f64>>> {
        self.get_typed(start, end, |value| match value {
            Value::NumberArray(array) => Some(array),
            _ => None,
        })
    }

    /// Reads a set of StringArray values, or `None` if the type does not match.
    pub fn get_string_array(&self, start: f64, end: f64) -> Option<ValueSet<Vec<String>>> {
        self.get_typed(start, end, |value| match value {
            Value::StringArray(array) => Some(array),
            _ => None,
        })
    }

    fn get_typed<T>(
        &self,
        start: f64,
        end: f64,
        extract: impl Fn(Value) -> Option<T>,
    ) -> Option<ValueSet<T>> {
        let range = self.get_range(start, end);
        let values: Vec<T> = range.values.into_iter().filter_map(&extract).collect();
        if values.len() != range.timestamps.len() {
            return None;
        }
        Some(ValueSet {
            timestamps: range.timestamps,
            values,
        })
    }

    /// Returns a serialized version of the data from this field.
    pub fn to_serialized(&self) -> SerializedField {
        SerializedField {
            field_type: self.field_type,
            timestamps: self.timestamps.clone(),
            values: self.values.clone(),
        }
    }

    /// Creates a new field based on the data from [`FieldStore::to_serialized`].
    pub fn from_serialized(serialized: SerializedField) -> Self {
        FieldStore {
            field_type: serialized.field_type,
            timestamps: serialized.timestamps,
            values: serialized.values,
        }
    }
}

/// Flat structural form of a [`FieldStore`] for cross-boundary transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedField {
    #[serde(rename = "type")]
    pub field_type: LoggableType,
    pub timestamps: Vec<f64>,
    pub values: Vec<Value>,
}
