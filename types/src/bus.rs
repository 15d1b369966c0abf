use core::fmt;
use core::str::FromStr;

use crate::AddressError;

/// One of the two non-overlapping clock phases of a switched-capacitor bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Phase {
    A,
    B,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::A, Phase::B];

    pub fn suffix(self) -> char {
        match self {
            Phase::A => 'a',
            Phase::B => 'b',
        }
    }

    pub fn from_suffix(c: char) -> Option<Self> {
        match c {
            'a' => Some(Phase::A),
            'b' => Some(Phase::B),
            _ => None,
        }
    }
}

/// A resistor bus, `RBUS1`..`RBUS8`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rbus(u8);

impl Rbus {
    pub const COUNT: u8 = 8;

    pub fn new(index: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&index).then_some(Rbus(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Rbus> {
        (1..=Self::COUNT).map(Rbus)
    }
}

impl fmt::Display for Rbus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RBUS{}", self.0)
    }
}

impl FromStr for Rbus {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("RBUS")
            .and_then(parse_digit)
            .and_then(Rbus::new)
            .ok_or_else(|| AddressError::InvalidBusName(s.to_string()))
    }
}

/// A switched-capacitor bus line, `SBUS1`..`SBUS6`, without a phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SbusLine(u8);

impl SbusLine {
    pub const COUNT: u8 = 6;

    pub fn new(index: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&index).then_some(SbusLine(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = SbusLine> {
        (1..=Self::COUNT).map(SbusLine)
    }

    pub fn phase(self, phase: Phase) -> Sbus {
        Sbus { line: self, phase }
    }
}

impl fmt::Display for SbusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SBUS{}", self.0)
    }
}

/// A single phase of a switched-capacitor bus, `SBUS1a`..`SBUS6b`.  This is the unit the
/// address equations work on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Sbus {
    pub line: SbusLine,
    pub phase: Phase,
}

impl Sbus {
    pub fn new(index: u8, phase: Phase) -> Option<Self> {
        SbusLine::new(index).map(|line| line.phase(phase))
    }

    pub fn all() -> impl Iterator<Item = Sbus> {
        SbusLine::all().flat_map(|line| Phase::ALL.map(|phase| line.phase(phase)))
    }
}

impl fmt::Display for Sbus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.line, self.phase.suffix())
    }
}

impl FromStr for Sbus {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AddressError::InvalidBusName(s.to_string());
        let rest = s.strip_prefix("SBUS").ok_or_else(err)?;
        let mut chars = rest.chars();
        let (Some(digit), Some(suffix), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(err());
        };
        let line = digit
            .to_digit(10)
            .and_then(|n| SbusLine::new(n as u8))
            .ok_or_else(err)?;
        let phase = Phase::from_suffix(suffix).ok_or_else(err)?;
        Ok(line.phase(phase))
    }
}

/// A bus as named by a connection document.
///
/// The derived ordering is the canonical traversal order: all RBUS before all SBUS, by bus
/// number, and for SBUS the unsuffixed (both-phase) form before `a` before `b`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Bus {
    Rbus(Rbus),
    /// `None` addresses both phases at once.
    Sbus(SbusLine, Option<Phase>),
}

impl Bus {
    pub fn is_rbus(self) -> bool {
        matches!(self, Bus::Rbus(_))
    }

    /// The phase-specific SBUS registers covered by this bus name.
    pub fn phases(self) -> Vec<Sbus> {
        match self {
            Bus::Rbus(_) => vec![],
            Bus::Sbus(line, Some(phase)) => vec![line.phase(phase)],
            Bus::Sbus(line, None) => Phase::ALL.map(|phase| line.phase(phase)).to_vec(),
        }
    }
}

impl From<Rbus> for Bus {
    fn from(rbus: Rbus) -> Self {
        Bus::Rbus(rbus)
    }
}

impl From<Sbus> for Bus {
    fn from(sbus: Sbus) -> Self {
        Bus::Sbus(sbus.line, Some(sbus.phase))
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bus::Rbus(rbus) => write!(f, "{rbus}"),
            Bus::Sbus(line, None) => write!(f, "{line}"),
            Bus::Sbus(line, Some(phase)) => write!(f, "{line}{}", phase.suffix()),
        }
    }
}

impl FromStr for Bus {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("RBUS") {
            return Ok(Bus::Rbus(s.parse()?));
        }
        if let Some(rest) = s.strip_prefix("SBUS") {
            if let Some(line) = parse_digit(rest).and_then(SbusLine::new) {
                return Ok(Bus::Sbus(line, None));
            }
            return Ok(s.parse::<Sbus>()?.into());
        }
        Err(AddressError::InvalidBusName(s.to_string()))
    }
}

fn parse_digit(s: &str) -> Option<u8> {
    let mut chars = s.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };
    c.to_digit(10).map(|n| n as u8)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_bus_names() {
        assert_eq!("RBUS1".parse::<Bus>().unwrap(), Bus::Rbus(Rbus(1)));
        assert_eq!("SBUS6".parse::<Bus>().unwrap(), Bus::Sbus(SbusLine(6), None));
        assert_eq!(
            "SBUS2b".parse::<Bus>().unwrap(),
            Bus::Sbus(SbusLine(2), Some(Phase::B))
        );
        for bad in ["RBUS0", "RBUS9", "RBUS10", "SBUS0a", "SBUS7", "SBUS1c", "SBUS", "XBUS1", "sbus1a"] {
            assert_matches!(bad.parse::<Bus>(), Err(AddressError::InvalidBusName(_)), "{bad}");
        }
        assert_matches!("SBUS1".parse::<Sbus>(), Err(AddressError::InvalidBusName(_)));
        assert_matches!("RBUS1a".parse::<Rbus>(), Err(AddressError::InvalidBusName(_)));
    }

    #[test]
    fn display_roundtrips_names() {
        for name in ["RBUS8", "SBUS3", "SBUS3a", "SBUS5b"] {
            assert_eq!(name.parse::<Bus>().unwrap().to_string(), name);
        }
        assert_eq!(Sbus::all().count(), 12);
    }

    #[test]
    fn canonical_bus_order() {
        let mut buses: Vec<Bus> = ["SBUS2b", "SBUS1a", "RBUS3", "SBUS2", "RBUS1", "SBUS2a"]
            .into_iter()
            .map(|name| name.parse().unwrap())
            .collect();
        buses.sort();
        let names: Vec<String> = buses.iter().map(|bus| bus.to_string()).collect();
        assert_eq!(names, ["RBUS1", "RBUS3", "SBUS1a", "SBUS2", "SBUS2a", "SBUS2b"]);
    }

    #[test]
    fn unsuffixed_sbus_covers_both_phases() {
        let bus: Bus = "SBUS4".parse().unwrap();
        let phases: Vec<String> = bus.phases().iter().map(|sbus| sbus.to_string()).collect();
        assert_eq!(phases, ["SBUS4a", "SBUS4b"]);
        assert!(Bus::Rbus(Rbus(2)).phases().is_empty());
    }
}
