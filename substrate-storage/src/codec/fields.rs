//! Typed helpers for writing and reading flat property maps.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use substrate_core::errors::{CodecError, SubstrateResult};
use substrate_core::graph::temporal::{from_millis, to_millis};
use substrate_core::{Bitemporal, PropertyMap, PropertyValue};

#[derive(Default)]
pub(crate) struct PropWriter {
    props: PropertyMap,
}

impl PropWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, key: &str, value: &str) {
        self.props.insert(key, PropertyValue::Text(value.to_string()));
    }

    pub fn opt_text(&mut self, key: &str, value: Option<&str>) {
        let v = value.map_or(PropertyValue::Null, |s| PropertyValue::Text(s.to_string()));
        self.props.insert(key, v);
    }

    pub fn float(&mut self, key: &str, value: f64) {
        self.props.insert(key, PropertyValue::Float(value));
    }

    pub fn int(&mut self, key: &str, value: i64) {
        self.props.insert(key, PropertyValue::Int(value));
    }

    pub fn uint(&mut self, key: &str, value: u64) {
        self.int(key, i64::try_from(value).unwrap_or(i64::MAX));
    }

    pub fn time(&mut self, key: &str, value: DateTime<Utc>) {
        self.int(key, to_millis(value));
    }

    pub fn opt_time(&mut self, key: &str, value: Option<DateTime<Utc>>) {
        let v = value.map_or(PropertyValue::Null, |t| PropertyValue::Int(to_millis(t)));
        self.props.insert(key, v);
    }

    pub fn text_array(&mut self, key: &str, values: &[String]) {
        self.props.insert(key, PropertyValue::TextArray(values.to_vec()));
    }

    pub fn float_array(&mut self, key: &str, values: &[f64]) {
        self.props.insert(key, PropertyValue::FloatArray(values.to_vec()));
    }

    pub fn opt_vector(&mut self, key: &str, value: Option<&Vec<f32>>) {
        let v = value.map_or(PropertyValue::Null, |v| PropertyValue::Vector(v.clone()));
        self.props.insert(key, v);
    }

    /// Serialize a nested structure to a JSON string property.
    pub fn blob<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), CodecError> {
        let text = serde_json::to_string(value).map_err(|e| CodecError::InvalidBlob {
            field: key.to_string(),
            reason: e.to_string(),
        })?;
        self.text(key, &text);
        Ok(())
    }

    pub fn temporal(&mut self, t: &Bitemporal) {
        self.time("valid_from", t.valid_from);
        self.opt_time("valid_to", t.valid_to);
        self.time("created_at", t.created_at);
        self.opt_time("expired_at", t.expired_at);
    }

    pub fn finish(self) -> PropertyMap {
        self.props
    }
}

pub(crate) struct PropReader<'a> {
    props: &'a PropertyMap,
}

impl<'a> PropReader<'a> {
    pub fn new(props: &'a PropertyMap) -> Self {
        Self { props }
    }

    fn value(&self, key: &str) -> Result<&'a PropertyValue, CodecError> {
        self.props.get(key).ok_or_else(|| CodecError::MissingField {
            field: key.to_string(),
        })
    }

    fn mismatch(key: &str, expected: &'static str) -> CodecError {
        CodecError::TypeMismatch {
            field: key.to_string(),
            expected,
        }
    }

    fn is_null(&self, key: &str) -> bool {
        self.props.get(key).map_or(true, PropertyValue::is_null)
    }

    pub fn text(&self, key: &str) -> Result<String, CodecError> {
        self.value(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::mismatch(key, "text"))
    }

    pub fn opt_text(&self, key: &str) -> Result<Option<String>, CodecError> {
        if self.is_null(key) {
            return Ok(None);
        }
        self.text(key).map(Some)
    }

    pub fn float(&self, key: &str) -> Result<f64, CodecError> {
        self.value(key)?
            .as_f64()
            .ok_or_else(|| Self::mismatch(key, "float"))
    }

    pub fn int(&self, key: &str) -> Result<i64, CodecError> {
        self.value(key)?
            .as_i64()
            .ok_or_else(|| Self::mismatch(key, "int"))
    }

    pub fn uint(&self, key: &str) -> Result<u64, CodecError> {
        Ok(self.int(key)?.max(0) as u64)
    }

    pub fn time(&self, key: &str) -> Result<DateTime<Utc>, CodecError> {
        from_millis(self.int(key)?).ok_or_else(|| Self::mismatch(key, "epoch milliseconds"))
    }

    pub fn opt_time(&self, key: &str) -> Result<Option<DateTime<Utc>>, CodecError> {
        if self.is_null(key) {
            return Ok(None);
        }
        self.time(key).map(Some)
    }

    pub fn text_array(&self, key: &str) -> Result<Vec<String>, CodecError> {
        self.value(key)?
            .as_text_array()
            .ok_or_else(|| Self::mismatch(key, "text array"))
    }

    pub fn float_array(&self, key: &str) -> Result<Vec<f64>, CodecError> {
        self.value(key)?
            .as_float_array()
            .ok_or_else(|| Self::mismatch(key, "float array"))
    }

    pub fn opt_vector(&self, key: &str) -> Result<Option<Vec<f32>>, CodecError> {
        if self.is_null(key) {
            return Ok(None);
        }
        self.value(key)?
            .as_vector()
            .map(Some)
            .ok_or_else(|| Self::mismatch(key, "vector"))
    }

    /// Parse a JSON string property back into its structure.
    pub fn blob<T: DeserializeOwned>(&self, key: &str) -> Result<T, CodecError> {
        let text = self.text(key)?;
        serde_json::from_str(&text).map_err(|e| CodecError::InvalidBlob {
            field: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a stored enum string with the enum's own parser.
    pub fn parsed<T>(&self, key: &str, parse: fn(&str) -> Option<T>) -> Result<T, CodecError> {
        let text = self.text(key)?;
        parse(&text).ok_or_else(|| Self::mismatch(key, "known enum value"))
    }

    pub fn temporal(&self) -> SubstrateResult<Bitemporal> {
        Ok(Bitemporal::from_parts(
            self.time("valid_from")?,
            self.opt_time("valid_to")?,
            self.time("created_at")?,
            self.opt_time("expired_at")?,
        )?)
    }
}
