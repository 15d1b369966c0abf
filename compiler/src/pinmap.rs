use std::collections::BTreeMap;
use std::path::Path;

use jzon::JsonValue;
use mosbius_types::{InternalRow, SwitchRow};

use crate::error::{ConfigError, Error};
use crate::json::parse_json;

/// Interprets a JSON value as a non-negative integer, accepting integral numbers and strings
/// holding one.
pub(crate) fn json_uint(value: &JsonValue) -> Option<u32> {
    if let Some(s) = value.as_str() {
        return s.trim().parse().ok();
    }
    let val = value.as_f64()?;
    if val.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&val) {
        return None;
    }
    Some(val as u32)
}

fn json_row(value: &JsonValue) -> Option<SwitchRow> {
    if let Some(s) = value.as_str() {
        return s.parse().ok();
    }
    let n = json_uint(value)?;
    let row = SwitchRow::Numeric(n);
    row.equation_index().ok().map(|_| row)
}

fn json_object<'a>(doc: &'a JsonValue, what: &str) -> Result<&'a JsonValue, ConfigError> {
    if doc.is_object() {
        Ok(doc)
    } else {
        Err(ConfigError::MalformedInput(format!(
            "{what} must be a JSON object"
        )))
    }
}

/// Maps terminal names to the switch matrix row they are wired to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PinMap {
    rows: BTreeMap<String, SwitchRow>,
}

impl PinMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, terminal: impl Into<String>, row: SwitchRow) -> Option<SwitchRow> {
        self.rows.insert(terminal.into(), row)
    }

    pub fn get(&self, terminal: &str) -> Option<SwitchRow> {
        self.rows.get(terminal).copied()
    }

    pub fn contains(&self, terminal: &str) -> bool {
        self.rows.contains_key(terminal)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SwitchRow)> {
        self.rows.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Builds a pin map from an object of terminal names to rows.  A row is an integer, a
    /// numeric string, or an internal row name such as `internal_B`.
    pub fn from_json(doc: &JsonValue) -> Result<Self, ConfigError> {
        let doc = json_object(doc, "pin map")?;
        let mut res = PinMap::new();
        for (terminal, value) in doc.entries() {
            let Some(row) = json_row(value) else {
                return Err(ConfigError::MalformedInput(format!(
                    "pin map: terminal {terminal:?} has invalid switch row {} (expected 1..92 or {}..{})",
                    value.dump(),
                    InternalRow::A,
                    InternalRow::D,
                )));
            };
            res.insert(terminal, row);
        }
        Ok(res)
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(Self::from_json(&parse_json(text)?)?)
    }

    pub fn from_file(fname: impl AsRef<Path>) -> Result<Self, Error> {
        Self::parse(&std::fs::read_to_string(fname)?)
    }
}

impl<S: Into<String>> FromIterator<(S, SwitchRow)> for PinMap {
    fn from_iter<T: IntoIterator<Item = (S, SwitchRow)>>(iter: T) -> Self {
        PinMap {
            rows: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Maps terminal names to package pin numbers.  Only used to label the debug table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PinNumbers {
    pins: BTreeMap<String, u32>,
}

impl PinNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, terminal: impl Into<String>, pin: u32) -> Option<u32> {
        self.pins.insert(terminal.into(), pin)
    }

    pub fn get(&self, terminal: &str) -> Option<u32> {
        self.pins.get(terminal).copied()
    }

    pub fn from_json(doc: &JsonValue) -> Result<Self, ConfigError> {
        let doc = json_object(doc, "pin number map")?;
        let mut res = PinNumbers::new();
        for (terminal, value) in doc.entries() {
            let Some(pin) = json_uint(value) else {
                return Err(ConfigError::MalformedInput(format!(
                    "pin number map: terminal {terminal:?} has invalid pin number {}",
                    value.dump()
                )));
            };
            res.insert(terminal, pin);
        }
        Ok(res)
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(Self::from_json(&parse_json(text)?)?)
    }

    pub fn from_file(fname: impl AsRef<Path>) -> Result<Self, Error> {
        Self::parse(&std::fs::read_to_string(fname)?)
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for PinNumbers {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        PinNumbers {
            pins: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
