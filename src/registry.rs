//! The log registry: a collection of typed, time-indexed fields.
//!
//! [`Log`] owns every [`FieldStore`] for a session, keyed by hierarchical
//! `/`-separated paths. Array-typed writes expand into synthetic per-index
//! item fields (`key/0`, `key/1`, ...) that are written only by the
//! expansion logic; direct writes to those keys are refused. A key's type
//! is fixed at first write and mismatched writes are silently dropped, so
//! downstream consumers never observe a type change.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::field::{FieldStore, SerializedField, ValueSet};
use crate::tree::FieldTree;
use crate::value::{LoggableType, Value};

/// Range reported before any write has occurred.
pub const DEFAULT_TIMESTAMP_RANGE: (f64, f64) = (0.0, 10.0);

/// A collection of log fields for one session.
#[derive(Debug, Clone, Default)]
pub struct Log {
    fields: BTreeMap<String, FieldStore>,
    array_lengths: BTreeMap<String, usize>,
    array_item_keys: BTreeSet<String>,
    timestamp_range: Option<(f64, f64)>,
}

impl Log {
    pub fn new() -> Self {
        Log::default()
    }

    /// Returns the registered field keys, array items included.
    pub fn get_field_keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Returns the count of fields, excluding array item fields.
    pub fn get_field_count(&self) -> usize {
        self.fields
            .keys()
            .filter(|key| !self.array_item_keys.contains(*key))
            .count()
    }

    /// Returns the constant field type, if the key is registered.
    pub fn get_type(&self, key: &str) -> Option<LoggableType> {
        self.fields.get(key).map(FieldStore::field_type)
    }

    /// Returns whether the key is a synthetic array item field.
    pub fn is_array_item(&self, key: &str) -> bool {
        self.array_item_keys.contains(key)
    }

    /// Returns the registered length of an array field.
    pub fn get_array_length(&self, key: &str) -> Option<usize> {
        self.array_lengths.get(key).copied()
    }

    /// Returns the sorted, deduplicated union of timestamps across fields.
    pub fn get_timestamps<S: AsRef<str>>(&self, keys: &[S]) -> Vec<f64> {
        let mut output: Vec<f64> = keys
            .iter()
            .filter_map(|key| self.fields.get(key.as_ref()))
            .flat_map(|field| field.get_timestamps().iter().copied())
            .collect();
        output.sort_by(f64::total_cmp);
        output.dedup();
        output
    }

    /// Returns the range of timestamps across all fields, or the default
    /// range if nothing has been written.
    pub fn get_timestamp_range(&self) -> (f64, f64) {
        self.timestamp_range.unwrap_or(DEFAULT_TIMESTAMP_RANGE)
    }

    /// Returns the most recent timestamp across all fields.
    pub fn get_last_timestamp(&self) -> Option<f64> {
        self.fields
            .values()
            .filter_map(|field| field.get_timestamps().last().copied())
            .max_by(f64::total_cmp)
    }

    /// Organizes the field keys into a tree, splitting on `/`.
    pub fn get_field_tree(&self, include_array_items: bool) -> FieldTree {
        let mut root = FieldTree::default();
        for key in self.fields.keys() {
            if !include_array_items && self.array_item_keys.contains(key) {
                continue;
            }
            root.insert_key(key);
        }
        root
    }

    fn process_timestamp(&mut self, timestamp: f64) {
        match &mut self.timestamp_range {
            None => self.timestamp_range = Some((timestamp, timestamp)),
            Some((min, max)) => {
                if timestamp < *min {
                    *min = timestamp;
                } else if timestamp > *max {
                    *max = timestamp;
                }
            }
        }
    }

    /// Registers the field if needed and writes the value. Returns false
    /// when the write was dropped for a type mismatch.
    fn put_field(&mut self, key: &str, timestamp: f64, value: Value) -> bool {
        let field = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| FieldStore::new(value.loggable_type()));
        if field.field_type() != value.loggable_type() {
            return false;
        }
        field.put(timestamp, value);
        self.process_timestamp(timestamp);
        true
    }

    /// Grows the registered index set of an array field to `new_length`.
    ///
    /// Item fields are never removed: a later write with fewer elements
    /// leaves the higher indices registered, it just writes nothing to
    /// them for that timestamp.
    fn expand_array(&mut self, key: &str, element_type: LoggableType, new_length: usize) {
        let old_length = self.array_lengths.get(key).copied().unwrap_or(0);
        for index in old_length..new_length {
            let item_key = format!("{key}/{index}");
            self.fields
                .entry(item_key.clone())
                .or_insert_with(|| FieldStore::new(element_type));
            self.array_item_keys.insert(item_key);
        }
        self.array_lengths
            .insert(key.to_string(), old_length.max(new_length));
    }

    fn put_item(&mut self, key: &str, index: usize, timestamp: f64, value: Value) {
        let item_key = format!("{key}/{index}");
        if let Some(field) = self.fields.get_mut(&item_key) {
            field.put(timestamp, value);
            self.process_timestamp(timestamp);
        }
    }

    /// Writes a new Raw value to the field.
    pub fn put_raw(&mut self, key: &str, timestamp: f64, value: Vec<u8>) {
        if self.array_item_keys.contains(key) {
            return;
        }
        self.put_field(key, timestamp, Value::Raw(value));
    }

    /// Writes a new Boolean value to the field.
    pub fn put_boolean(&mut self, key: &str, timestamp: f64, value: bool) {
        if self.array_item_keys.contains(key) {
            return;
        }
        self.put_field(key, timestamp, Value::Boolean(value));
    }

    /// Writes a new Number value to the field.
    pub fn put_number(&mut self, key: &str, timestamp: f64, value: f64) {
        if self.array_item_keys.contains(key) {
            return;
        }
        self.put_field(key, timestamp, Value::Number(value));
    }

    /// Writes a new String value to the field.
    pub fn put_string(&mut self, key: &str, timestamp: f64, value: String) {
        if self.array_item_keys.contains(key) {
            return;
        }
        self.put_field(key, timestamp, Value::String(value));
    }

    /// Writes a new BooleanArray value, expanding item fields as needed.
    pub fn put_boolean_array(&mut self, key: &str, timestamp: f64, value: Vec<bool>) {
        if self.array_item_keys.contains(key) {
            return;
        }
        if !self.put_field(key, timestamp, Value::BooleanArray(value.clone())) {
            return;
        }
        self.expand_array(key, LoggableType::Boolean, value.len());
        for (index, element) in value.into_iter().enumerate() {
            self.put_item(key, index, timestamp, Value::Boolean(element));
        }
    }

    /// Writes a new NumberArray value, expanding item fields as needed.
    pub fn put_number_array(&mut self, key: &str, timestamp: f64, value: Vec<f64>) {
        if self.array_item_keys.contains(key) {
            return;
        }
        if !self.put_field(key, timestamp, Value::NumberArray(value.clone())) {
            return;
        }
        self.expand_array(key, LoggableType::Number, value.len());
        for (index, element) in value.into_iter().enumerate() {
            self.put_item(key, index, timestamp, Value::Number(element));
        }
    }

    /// Writes a new StringArray value, expanding item fields as needed.
    pub fn put_string_array(&mut self, key: &str, timestamp: f64, value: Vec<String>) {
        if self.array_item_keys.contains(key) {
            return;
        }
        if !self.put_field(key, timestamp, Value::StringArray(value.clone())) {
            return;
        }
        self.expand_array(key, LoggableType::String, value.len());
        for (index, element) in value.into_iter().enumerate() {
            self.put_item(key, index, timestamp, Value::String(element));
        }
    }

    /// Reads a set of generic values from the field.
    pub fn get_range(&self, key: &str, start: f64, end: f64) -> Option<ValueSet<Value>> {
        Some(self.fields.get(key)?.get_range(start, end))
    }

    /// Reads a set of Raw values from the field.
    pub fn get_raw(&self, key: &str, start: f64, end: f64) -> Option<ValueSet<Vec<u8>>> {
        self.fields.get(key)?.get_raw(start, end)
    }

    /// Reads a set of Boolean values from the field.
    pub fn get_boolean(&self, key: &str, start: f64, end: f64) -> Option<ValueSet<bool>> {
        self.fields.get(key)?.get_boolean(start, end)
    }

    /// Reads a set of Number values from the field.
    pub fn get_number(&self, key: &str, start: f64, end: f64) -> Option<ValueSet<f64>> {
        self.fields.get(key)?.get_number(start, end)
    }

    /// Reads a set of String values from the field.
    pub fn get_string(&self, key: &str, start: f64, end: f64) -> Option<ValueSet<String>> {
        self.fields.get(key)?.get_string(start, end)
    }

    /// Reads a set of BooleanArray values from the field.
    pub fn get_boolean_array(
        &self,
        key: &str,
        start: f64,
        end: f64,
    ) -> Option<ValueSet<Vec<bool>>> {
        self.fields.get(key)?.get_boolean_array(start, end)
    }

    /// Reads a set of NumberArray values from the field.
    pub fn get_number_array(&self, key: &str, start: f64, end: f64) -> Option<ValueSet<Vec<f64>>> {
        self.fields.get(key)?.get_number_array(start, end)
    }

    /// Reads a set of StringArray values from the field.
    pub fn get_string_array(
        &self,
        key: &str,
        start: f64,
        end: f64,
    ) -> Option<ValueSet<Vec<String>>> {
        self.fields.get(key)?.get_string_array(start, end)
    }

    /// Returns the registry's entire state in flat structural form, for
    /// cross-thread or cross-process transfer.
    pub fn to_serialized(&self) -> SerializedLog {
        SerializedLog {
            fields: self
                .fields
                .iter()
                .map(|(key, field)| (key.clone(), field.to_serialized()))
                .collect(),
            array_lengths: self.array_lengths.clone(),
            array_item_keys: self.array_item_keys.iter().cloned().collect(),
            timestamp_range: self.timestamp_range,
        }
    }

    /// Reconstructs a registry from the data of [`Log::to_serialized`].
    pub fn from_serialized(serialized: SerializedLog) -> Self {
        Log {
            fields: serialized
                .fields
                .into_iter()
                .map(|(key, field)| (key, FieldStore::from_serialized(field)))
                .collect(),
            array_lengths: serialized.array_lengths,
            array_item_keys: serialized.array_item_keys.into_iter().collect(),
            timestamp_range: serialized.timestamp_range,
        }
    }
}

/// Flat structural form of a [`Log`] for cross-boundary transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedLog {
    pub fields: BTreeMap<String, SerializedField>,
    pub array_lengths: BTreeMap<String, usize>,
    pub array_item_keys: Vec<String>,
    pub timestamp_range: Option<(f64, f64)>,
}
