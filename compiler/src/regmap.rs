//! Cross-checks of precomputed register maps against the address equations.
//!
//! Older tooling shipped the switch matrix and sizing addresses as JSON lookup tables.  These
//! checks confirm that such a table agrees, entry for entry, with [`mosbius_types::equations`].

use std::collections::{BTreeMap, BTreeSet};

use jzon::JsonValue;
use log::debug;
use mosbius_types::device::SIZE_WEIGHTS;
use mosbius_types::equations::{
    SIZING_REGISTERS, rbus_address, sbus_address, sizing_register,
};
use mosbius_types::{AddressError, InternalRow, Rbus, Sbus, SwitchRow};

use crate::pinmap::json_uint;

const DISPLAY_NAME_KEY: &str = "display_name";

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RegisterMapError {
    NotAnObject(String),
    RowCount(usize),
    MissingKey { row: String, key: String },
    UnexpectedKey { row: String, key: String },
    InvalidRegister { row: String, key: String, value: String },
    /// A numeric row sorted into an internal slot, or the other way round.
    MisplacedRow { row: String, slot: u32 },
    MissingInternalRows(Vec<InternalRow>),
    Mismatch { row: String, key: String, expected: u32, actual: u32 },
    DuplicateRegister(u32),
    NotContiguous { first: u32, last: u32, count: usize },
    Address(AddressError),
}

impl std::fmt::Display for RegisterMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterMapError::NotAnObject(what) => write!(f, "{what} must be a JSON object"),
            RegisterMapError::RowCount(n) => write!(f, "expected 96 rows, got {n}"),
            RegisterMapError::MissingKey { row, key } => {
                write!(f, "row {row:?} is missing required key {key:?}")
            }
            RegisterMapError::UnexpectedKey { row, key } => {
                write!(f, "row {row:?} has unexpected key {key:?}")
            }
            RegisterMapError::InvalidRegister { row, key, value } => {
                write!(f, "row {row:?} key {key:?}: register {value} is not an integer")
            }
            RegisterMapError::MisplacedRow { row, slot } => {
                write!(f, "row {row:?} does not belong at equation index {slot}")
            }
            RegisterMapError::MissingInternalRows(rows) => {
                write!(f, "missing internal rows:")?;
                for row in rows {
                    write!(f, " {row}")?;
                }
                Ok(())
            }
            RegisterMapError::Mismatch {
                row,
                key,
                expected,
                actual,
            } => write!(
                f,
                "mismatch at row {row:?} key {key:?}: expected {expected}, actual {actual}"
            ),
            RegisterMapError::DuplicateRegister(reg) => write!(f, "duplicate register {reg}"),
            RegisterMapError::NotContiguous { first, last, count } => write!(
                f,
                "{count} sizing registers are not contiguous from 1889 (range {first}..{last})"
            ),
            RegisterMapError::Address(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for RegisterMapError {}

impl From<AddressError> for RegisterMapError {
    fn from(value: AddressError) -> Self {
        Self::Address(value)
    }
}

fn register(row: &str, data: &JsonValue, key: &str) -> Result<u32, RegisterMapError> {
    if !data.has_key(key) {
        return Err(RegisterMapError::MissingKey {
            row: row.to_string(),
            key: key.to_string(),
        });
    }
    json_uint(&data[key]).ok_or_else(|| RegisterMapError::InvalidRegister {
        row: row.to_string(),
        key: key.to_string(),
        value: data[key].dump(),
    })
}

fn check(row: &str, key: &str, expected: u32, actual: u32) -> Result<(), RegisterMapError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RegisterMapError::Mismatch {
            row: row.to_string(),
            key: key.to_string(),
            expected,
            actual,
        })
    }
}

/// Validates a switch matrix register map: an object of row keys to objects of bus names to
/// registers.
///
/// Rows are ordered by their `SBUS1a` register and matched against the rows in equation index
/// order.  Internal rows carry only the 12 SBUS keys, numeric rows carry all 12 SBUS and 8
/// RBUS keys.  Returns the number of rows and of bus entries checked.
pub fn validate_register_map(doc: &JsonValue) -> Result<(usize, usize), RegisterMapError> {
    if !doc.is_object() {
        return Err(RegisterMapError::NotAnObject("register map".into()));
    }
    let mut rows = vec![];
    for (key, data) in doc.entries() {
        if !data.is_object() {
            return Err(RegisterMapError::NotAnObject(format!("row {key:?}")));
        }
        rows.push((register(key, data, "SBUS1a")?, key, data));
    }
    rows.sort_by_key(|&(sbus1a, _, _)| sbus1a);
    if rows.len() != SwitchRow::all().count() {
        return Err(RegisterMapError::RowCount(rows.len()));
    }

    let sbus_keys: Vec<(Sbus, String)> = Sbus::all().map(|sbus| (sbus, sbus.to_string())).collect();
    let rbus_keys: Vec<(Rbus, String)> = Rbus::all().map(|rbus| (rbus, rbus.to_string())).collect();

    let mut entries = 0;
    let mut seen_internal = BTreeSet::new();
    for (slot, (row, &(_, key, data))) in (1..).zip(SwitchRow::all().zip(&rows)) {
        let is_internal = InternalRow::from_name(key).is_some();
        let expected_keys: BTreeSet<&str> = match row {
            SwitchRow::Internal(_) => {
                let Some(internal) = InternalRow::from_name(key) else {
                    return Err(RegisterMapError::MisplacedRow {
                        row: key.to_string(),
                        slot,
                    });
                };
                seen_internal.insert(internal);
                sbus_keys.iter().map(|(_, name)| name.as_str()).collect()
            }
            SwitchRow::Numeric(_) => {
                if is_internal {
                    return Err(RegisterMapError::MisplacedRow {
                        row: key.to_string(),
                        slot,
                    });
                }
                sbus_keys
                    .iter()
                    .map(|(_, name)| name.as_str())
                    .chain(rbus_keys.iter().map(|(_, name)| name.as_str()))
                    .collect()
            }
        };
        let actual_keys: BTreeSet<&str> = data
            .entries()
            .map(|(bus, _)| bus)
            .filter(|&bus| bus != DISPLAY_NAME_KEY)
            .collect();
        if let Some(missing) = expected_keys.difference(&actual_keys).next() {
            return Err(RegisterMapError::MissingKey {
                row: key.to_string(),
                key: missing.to_string(),
            });
        }
        if let Some(unexpected) = actual_keys.difference(&expected_keys).next() {
            return Err(RegisterMapError::UnexpectedKey {
                row: key.to_string(),
                key: unexpected.to_string(),
            });
        }

        for (sbus, name) in &sbus_keys {
            check(key, name, sbus_address(row, *sbus)?, register(key, data, name)?)?;
            entries += 1;
        }
        if let SwitchRow::Numeric(_) = row {
            for (rbus, name) in &rbus_keys {
                check(key, name, rbus_address(row, *rbus)?, register(key, data, name)?)?;
                entries += 1;
            }
        }
    }

    let missing: Vec<InternalRow> = InternalRow::ALL
        .into_iter()
        .filter(|row| !seen_internal.contains(row))
        .collect();
    if !missing.is_empty() {
        return Err(RegisterMapError::MissingInternalRows(missing));
    }

    debug!("register map: {n} rows, {entries} entries match", n = rows.len());
    Ok((rows.len(), entries))
}

/// Validates a sizing map: an object of device names to objects of bit weights (`"1"` ..
/// `"16"`) to registers.
///
/// Besides matching the equations entry for entry, the registers must be distinct and form one
/// contiguous block starting at the first sizing register.  Returns the number of devices and
/// of entries checked.
pub fn validate_sizing_map(doc: &JsonValue) -> Result<(usize, usize), RegisterMapError> {
    if !doc.is_object() || doc.is_empty() {
        return Err(RegisterMapError::NotAnObject("sizing map".into()));
    }
    let weight_keys: BTreeMap<String, u32> =
        SIZE_WEIGHTS.iter().map(|&w| (w.to_string(), w)).collect();
    let mut seen = BTreeSet::new();
    let mut devices = 0;
    for (device, data) in doc.entries() {
        if !data.is_object() {
            return Err(RegisterMapError::NotAnObject(format!("device {device:?}")));
        }
        for (key, _) in data.entries() {
            if !weight_keys.contains_key(key) {
                return Err(RegisterMapError::UnexpectedKey {
                    row: device.to_string(),
                    key: key.to_string(),
                });
            }
        }
        for (key, &weight) in &weight_keys {
            let actual = register(device, data, key)?;
            check(device, key, sizing_register(device, weight)?, actual)?;
            if !seen.insert(actual) {
                return Err(RegisterMapError::DuplicateRegister(actual));
            }
        }
        devices += 1;
    }

    let first = seen.first().copied().unwrap_or_default();
    let last = seen.last().copied().unwrap_or_default();
    let count = seen.len();
    if first != *SIZING_REGISTERS.start() || (last - first) as usize + 1 != count {
        return Err(RegisterMapError::NotContiguous { first, last, count });
    }

    debug!("sizing map: {devices} devices, {count} entries match");
    Ok((devices, count))
}
