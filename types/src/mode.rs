use core::fmt;

use crate::Phase;

/// How a terminal is connected to a switched-capacitor bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ConnectionMode {
    On,
    Off,
    Phi1,
    Phi2,
}

impl ConnectionMode {
    pub const ALL: [ConnectionMode; 4] = [
        ConnectionMode::On,
        ConnectionMode::Off,
        ConnectionMode::Phi1,
        ConnectionMode::Phi2,
    ];

    /// Parses a mode literal.  Surrounding whitespace and case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "ON" => Some(ConnectionMode::On),
            "OFF" => Some(ConnectionMode::Off),
            "PHI1" => Some(ConnectionMode::Phi1),
            "PHI2" => Some(ConnectionMode::Phi2),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConnectionMode::On => "ON",
            ConnectionMode::Off => "OFF",
            ConnectionMode::Phi1 => "PHI1",
            ConnectionMode::Phi2 => "PHI2",
        }
    }

    /// The short form used in connection tables.
    pub fn short_name(self) -> &'static str {
        match self {
            ConnectionMode::Phi1 => "PH1",
            ConnectionMode::Phi2 => "PH2",
            _ => self.name(),
        }
    }

    /// The (phase a, phase b) switch states.
    pub fn pair(self) -> (bool, bool) {
        match self {
            ConnectionMode::On => (true, true),
            ConnectionMode::Off => (false, false),
            ConnectionMode::Phi1 => (true, false),
            ConnectionMode::Phi2 => (false, true),
        }
    }

    pub fn bit(self, phase: Phase) -> bool {
        let (a, b) = self.pair();
        match phase {
            Phase::A => a,
            Phase::B => b,
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_pairs() {
        assert_eq!(ConnectionMode::On.pair(), (true, true));
        assert_eq!(ConnectionMode::Off.pair(), (false, false));
        assert_eq!(ConnectionMode::Phi1.pair(), (true, false));
        assert_eq!(ConnectionMode::Phi2.pair(), (false, true));
        assert!(ConnectionMode::Phi2.bit(Phase::B));
        assert!(!ConnectionMode::Phi2.bit(Phase::A));
    }

    #[test]
    fn mode_names() {
        assert_eq!(ConnectionMode::from_name(" phi1 "), Some(ConnectionMode::Phi1));
        assert_eq!(ConnectionMode::from_name("Off"), Some(ConnectionMode::Off));
        assert_eq!(ConnectionMode::from_name("PH1"), None);
        for mode in ConnectionMode::ALL {
            assert_eq!(ConnectionMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(ConnectionMode::Phi2.short_name(), "PH2");
        assert_eq!(ConnectionMode::On.short_name(), "ON");
    }
}
