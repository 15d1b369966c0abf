use crate::InternalRow;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AddressError {
    /// A switch row that is neither a numeric row in 1..=92 nor an internal row.
    RowOutOfRange(String),
    InvalidBusName(String),
    UndefinedForInternalRow(InternalRow),
    UnknownDevice(String),
    InvalidWeight(u32),
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressError::RowOutOfRange(row) => {
                write!(f, "switch row {row:?} out of range (expected 1..92 or internal_A..D)")
            }
            AddressError::InvalidBusName(name) => write!(
                f,
                "invalid bus name {name:?} (expected RBUS1..RBUS8 or SBUS1a..SBUS6b)"
            ),
            AddressError::UndefinedForInternalRow(row) => {
                write!(f, "RBUS is undefined for internal row {row}")
            }
            AddressError::UnknownDevice(name) => write!(f, "unknown sizing device {name:?}"),
            AddressError::InvalidWeight(weight) => {
                write!(f, "bit weight {weight} is not one of 1, 2, 4, 8, 16")
            }
        }
    }
}

impl std::error::Error for AddressError {}
