use core::fmt;
use core::str::FromStr;

use crate::AddressError;
use crate::equations::{NUM_NUMERIC_ROWS, switch_equation_index};

/// The four switch rows that are not bonded out to package pins.  Each bank owns one of them
/// as its 24th equation slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum InternalRow {
    A,
    B,
    C,
    D,
}

impl InternalRow {
    pub const ALL: [InternalRow; 4] = [InternalRow::A, InternalRow::B, InternalRow::C, InternalRow::D];

    pub fn name(self) -> &'static str {
        match self {
            InternalRow::A => "internal_A",
            InternalRow::B => "internal_B",
            InternalRow::C => "internal_C",
            InternalRow::D => "internal_D",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|row| row.name() == name)
    }

    /// The bank (0..4) owning this row.
    pub fn bank(self) -> u32 {
        match self {
            InternalRow::A => 0,
            InternalRow::B => 1,
            InternalRow::C => 2,
            InternalRow::D => 3,
        }
    }
}

impl fmt::Display for InternalRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A row of the switch matrix, as named by the pin map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SwitchRow {
    /// Numeric rows 1..=92.  Values outside that range can be constructed, but every address
    /// equation rejects them.
    Numeric(u32),
    Internal(InternalRow),
}

impl SwitchRow {
    pub fn numeric() -> impl Iterator<Item = SwitchRow> {
        (1..=NUM_NUMERIC_ROWS).map(SwitchRow::Numeric)
    }

    /// All 96 rows, in equation index order.
    pub fn all() -> impl Iterator<Item = SwitchRow> {
        (0..4).flat_map(|bank| {
            (1..=23)
                .map(move |slot| SwitchRow::Numeric(bank * 23 + slot))
                .chain([SwitchRow::Internal(InternalRow::ALL[bank as usize])])
        })
    }

    pub fn equation_index(self) -> Result<u32, AddressError> {
        switch_equation_index(self)
    }
}

impl From<InternalRow> for SwitchRow {
    fn from(row: InternalRow) -> Self {
        SwitchRow::Internal(row)
    }
}

impl fmt::Display for SwitchRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchRow::Numeric(n) => write!(f, "{n}"),
            SwitchRow::Internal(row) => write!(f, "{row}"),
        }
    }
}

impl FromStr for SwitchRow {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(row) = InternalRow::from_name(s) {
            return Ok(SwitchRow::Internal(row));
        }
        match s.parse::<u32>() {
            Ok(n) if (1..=NUM_NUMERIC_ROWS).contains(&n) => Ok(SwitchRow::Numeric(n)),
            _ => Err(AddressError::RowOutOfRange(s.to_string())),
        }
    }
}
