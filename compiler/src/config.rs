use std::collections::BTreeMap;
use std::path::Path;

use jzon::JsonValue;
use log::{debug, warn};
use mosbius_types::device::MAX_SIZE;
use mosbius_types::{Bus, ConnectionMode, DeviceId};
use unnamed_entity::EntityVec;

use crate::error::{ConfigError, Error};
use crate::json::parse_json;
use crate::pinmap::PinMap;

/// One terminal attached to a bus.  RBUS connections are always [`ConnectionMode::On`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Connection {
    pub terminal: String,
    pub mode: ConnectionMode,
}

pub type Sizes = EntityVec<DeviceId, u8>;

/// A validated connection document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanonicalConfig {
    /// Connections per bus, in document order within a bus.  A bus listed with no entries is
    /// kept, so that it still shows up in the connection table.
    pub connections: BTreeMap<Bus, Vec<Connection>>,
    /// One size per device, in device order.
    pub sizes: Sizes,
    /// Questionable but accepted input, one line each.
    pub warnings: Vec<String>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        CanonicalConfig {
            connections: BTreeMap::new(),
            sizes: DeviceId::all().map(|_| 0).collect(),
            warnings: vec![],
        }
    }
}

fn malformed(msg: String) -> ConfigError {
    ConfigError::MalformedInput(msg)
}

/// Splits a `TERMINAL@MODE` entry at its last `@`.  Returns the mode literal as written.
fn split_suffix(entry: &str) -> (&str, Option<&str>) {
    match entry.rsplit_once('@') {
        Some((terminal, mode)) => (terminal, Some(mode)),
        None => (entry, None),
    }
}

fn parse_mode(mode: &str, path: &str) -> Result<ConnectionMode, ConfigError> {
    ConnectionMode::from_name(mode).ok_or_else(|| ConfigError::InvalidMode {
        path: path.to_string(),
        mode: mode.to_string(),
    })
}

fn size_value(raw: &JsonValue) -> Option<i64> {
    if let Some(s) = raw.as_str() {
        return s.trim().parse().ok();
    }
    if !raw.is_number() {
        return None;
    }
    let val = raw.as_f64()?;
    (val.fract() == 0.0 && val.abs() < 1e15).then_some(val as i64)
}

fn parse_size(raw: &JsonValue, path: &str) -> Result<u8, ConfigError> {
    let invalid = || ConfigError::InvalidSize {
        path: path.to_string(),
        value: raw.dump(),
    };
    let raw_val = if raw.is_array() {
        if raw.len() != 1 {
            return Err(invalid());
        }
        &raw[0]
    } else {
        raw
    };
    let val = size_value(raw_val).ok_or_else(invalid)?;
    match u8::try_from(val) {
        Ok(size) if size <= MAX_SIZE => Ok(size),
        _ => Err(invalid()),
    }
}

impl CanonicalConfig {
    /// An empty configuration: no connections, every device at size 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bus: Bus, terminal: impl Into<String>, mode: ConnectionMode) {
        let mode = if bus.is_rbus() { ConnectionMode::On } else { mode };
        self.connections.entry(bus).or_default().push(Connection {
            terminal: terminal.into(),
            mode,
        });
    }

    pub fn with_size(mut self, device: DeviceId, size: u8) -> Self {
        self.sizes[device] = size;
        self
    }

    /// Every (bus, connection) pair in canonical order.
    pub fn iter_connections(&self) -> impl Iterator<Item = (Bus, &Connection)> {
        self.connections
            .iter()
            .flat_map(|(&bus, conns)| conns.iter().map(move |conn| (bus, conn)))
    }

    /// Validates a connection document against a pin map.
    ///
    /// The document is an object with optional `connections` and `sizes` objects.  Without a
    /// `connections` key, every top-level key other than `sizes` is taken as a bus.
    ///
    /// A parsed [`JsonValue`] has already lost repeated keys; [`CanonicalConfig::parse`] rejects
    /// them.
    pub fn normalize(doc: &JsonValue, pins: &PinMap) -> Result<Self, ConfigError> {
        if !doc.is_object() {
            return Err(malformed("configuration must be a JSON object".into()));
        }
        let mut res = CanonicalConfig::new();

        let buses: Vec<(&str, &JsonValue)> = if doc.has_key("connections") {
            let raw = &doc["connections"];
            if !raw.is_object() {
                return Err(malformed("connections must be a JSON object".into()));
            }
            if let Some((key, _)) = doc
                .entries()
                .find(|&(key, _)| key != "connections" && key != "sizes")
            {
                return Err(malformed(format!(
                    "unexpected top-level key {key:?} beside connections"
                )));
            }
            raw.entries().collect()
        } else {
            doc.entries().filter(|&(key, _)| key != "sizes").collect()
        };

        for (key, entries) in buses {
            let bus: Bus = key
                .parse()
                .map_err(|_| ConfigError::UnknownBusName(key.to_string()))?;
            if !entries.is_array() {
                return Err(malformed(format!("connections.{key} must be a list")));
            }
            let list = res.connections.entry(bus).or_default();
            for (i, entry) in entries.members().enumerate() {
                let path = format!("connections.{key}[{i}]");
                let conn = if bus.is_rbus() {
                    let Some(terminal) = entry.as_str() else {
                        return Err(malformed(format!("{path} must be a terminal name")));
                    };
                    Connection {
                        terminal: terminal.to_string(),
                        mode: ConnectionMode::On,
                    }
                } else {
                    parse_sbus_entry(entry, &path, &mut res.warnings)?
                };
                if !pins.contains(&conn.terminal) {
                    return Err(ConfigError::UnknownTerminal {
                        path,
                        terminal: conn.terminal,
                    });
                }
                list.push(conn);
            }
        }

        if doc.has_key("sizes") {
            let raw = &doc["sizes"];
            if !raw.is_object() {
                return Err(malformed("sizes must be a JSON object".into()));
            }
            for (name, value) in raw.entries() {
                let device = DeviceId::from_name(name)
                    .ok_or_else(|| ConfigError::UnknownDevice(name.to_string()))?;
                res.sizes[device] = parse_size(value, &format!("sizes.{name}"))?;
            }
        }

        debug!(
            "normalized configuration: {n} buses, {c} connections, {s} sized devices",
            n = res.connections.len(),
            c = res.iter_connections().count(),
            s = res.sizes.values().filter(|&&size| size != 0).count(),
        );
        Ok(res)
    }

    pub fn parse(text: &str, pins: &PinMap) -> Result<Self, Error> {
        Ok(Self::normalize(&parse_json(text)?, pins)?)
    }

    pub fn from_file(fname: impl AsRef<Path>, pins: &PinMap) -> Result<Self, Error> {
        Self::parse(&std::fs::read_to_string(fname)?, pins)
    }
}

fn parse_sbus_entry(
    entry: &JsonValue,
    path: &str,
    warnings: &mut Vec<String>,
) -> Result<Connection, ConfigError> {
    if let Some(text) = entry.as_str() {
        let (terminal, suffix) = split_suffix(text);
        let mode = match suffix {
            Some(mode) => parse_mode(mode, path)?,
            None => ConnectionMode::On,
        };
        return Ok(Connection {
            terminal: terminal.to_string(),
            mode,
        });
    }
    if !entry.is_object() {
        return Err(malformed(format!(
            "{path} must be a terminal name or an object, got {}",
            entry.dump()
        )));
    }
    let Some(text) = entry["terminal"].as_str() else {
        return Err(malformed(format!(
            "{path} is missing required string field 'terminal'"
        )));
    };
    let (terminal, suffix) = split_suffix(text);
    let mode = match (suffix, entry.has_key("connection")) {
        (Some(suffix), false) => parse_mode(suffix, path)?,
        (Some(suffix), true) => {
            let mode = parse_mode(suffix, path)?;
            let raw = &entry["connection"];
            let explicit = raw.as_str().and_then(ConnectionMode::from_name);
            if explicit != Some(mode) {
                let explicit = match explicit {
                    Some(explicit) => explicit.to_string(),
                    None => raw.dump(),
                };
                let msg = format!(
                    "{path}: terminal suffix @{mode} overrides connection {explicit}"
                );
                warn!("{msg}");
                warnings.push(msg);
            }
            mode
        }
        (None, true) => {
            let raw = &entry["connection"];
            let Some(mode) = raw.as_str() else {
                return Err(ConfigError::InvalidMode {
                    path: path.to_string(),
                    mode: raw.dump(),
                });
            };
            parse_mode(mode, path)?
        }
        (None, false) => ConnectionMode::Off,
    };
    Ok(Connection {
        terminal: terminal.to_string(),
        mode,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mosbius_types::{Phase, Rbus, SbusLine, SwitchRow};
    use unnamed_entity::EntityId;

    use super::*;

    fn pins() -> PinMap {
        PinMap::from_iter([
            ("T", SwitchRow::Numeric(1)),
            ("U", SwitchRow::Numeric(24)),
            ("VDD", SwitchRow::Numeric(60)),
        ])
    }

    fn norm(text: &str) -> Result<CanonicalConfig, ConfigError> {
        CanonicalConfig::normalize(&jzon::parse(text).unwrap(), &pins())
    }

    fn rbus(n: u8) -> Bus {
        Bus::Rbus(Rbus::new(n).unwrap())
    }

    fn sbus(n: u8, phase: Option<Phase>) -> Bus {
        Bus::Sbus(SbusLine::new(n).unwrap(), phase)
    }

    fn conn(terminal: &str, mode: ConnectionMode) -> Connection {
        Connection {
            terminal: terminal.into(),
            mode,
        }
    }

    #[test]
    fn sbus_entry_forms() {
        let cfg = norm(
            r#"{"connections": {"SBUS1a": [
                "T",
                "U@phi2",
                "VDD@ off ",
                {"terminal": "T"},
                {"terminal": "T", "connection": "phi1"},
                {"terminal": "U@ON", "connection": "ON"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(
            cfg.connections[&sbus(1, Some(Phase::A))],
            [
                conn("T", ConnectionMode::On),
                conn("U", ConnectionMode::Phi2),
                conn("VDD", ConnectionMode::Off),
                conn("T", ConnectionMode::Off),
                conn("T", ConnectionMode::Phi1),
                conn("U", ConnectionMode::On),
            ]
        );
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn suffix_overrides_connection() {
        let cfg = norm(r#"{"connections": {"SBUS2": [{"terminal": "T@PHI1", "connection": "OFF"}]}}"#)
            .unwrap();
        assert_eq!(cfg.connections[&sbus(2, None)], [conn("T", ConnectionMode::Phi1)]);
        assert_eq!(cfg.warnings.len(), 1);
        assert!(cfg.warnings[0].contains("connections.SBUS2[0]"));
    }

    #[test]
    fn suffix_overrides_invalid_connection() {
        let cfg = norm(
            r#"{"connections": {"SBUS1a": [
                {"terminal": "T@ON", "connection": "HALF"},
                {"terminal": "U@phi1", "connection": 1}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(
            cfg.connections[&sbus(1, Some(Phase::A))],
            [conn("T", ConnectionMode::On), conn("U", ConnectionMode::Phi1)]
        );
        assert_eq!(cfg.warnings.len(), 2);
        assert!(cfg.warnings[0].contains("connections.SBUS1a[0]"));
        assert!(cfg.warnings[0].contains("\"HALF\""));
        assert!(cfg.warnings[1].contains("connections.SBUS1a[1]"));
    }

    #[test]
    fn unexpected_top_level_keys() {
        assert_eq!(
            norm(r#"{"connections": {}, "RBUS1": ["T"]}"#),
            Err(ConfigError::MalformedInput(
                "unexpected top-level key \"RBUS1\" beside connections".into()
            ))
        );
        assert_matches!(
            norm(r#"{"sizes": {}, "connections": {}, "name": "amp"}"#),
            Err(ConfigError::MalformedInput(msg)) if msg.contains("\"name\"")
        );
        assert!(norm(r#"{"sizes": {"OTA_P": 1}, "connections": {"RBUS1": ["T"]}}"#).is_ok());
    }

    #[test]
    fn repeated_keys() {
        let pins = pins();
        for text in [
            r#"{"connections": {"SBUS1a": ["T@ON"], "SBUS1a": ["T@OFF"]}}"#,
            r#"{"RBUS1": ["T"], "RBUS1": ["U"]}"#,
            r#"{"sizes": {"OTA_P": 1, "OTA_P": 2}}"#,
        ] {
            assert_matches!(
                CanonicalConfig::parse(text, &pins),
                Err(Error::Config(ConfigError::MalformedInput(msg))) if msg.contains("duplicate key"),
                "{text}"
            );
        }
        // keys repeat freely across sibling objects
        let cfg = CanonicalConfig::parse(
            r#"{"connections": {"SBUS1a": [{"terminal": "T", "connection": "ON"}, {"terminal": "U", "connection": "ON"}]}}"#,
            &pins,
        )
        .unwrap();
        assert_eq!(cfg.iter_connections().count(), 2);
    }

    #[test]
    fn rbus_entries() {
        let cfg = norm(r#"{"connections": {"RBUS3": ["T", "VDD"], "RBUS1": []}}"#).unwrap();
        assert_eq!(
            cfg.connections[&rbus(3)],
            [conn("T", ConnectionMode::On), conn("VDD", ConnectionMode::On)]
        );
        assert!(cfg.connections[&rbus(1)].is_empty());
        assert_matches!(
            norm(r#"{"connections": {"RBUS3": ["T", 7]}}"#),
            Err(ConfigError::MalformedInput(msg)) if msg.contains("connections.RBUS3[1]")
        );
        assert_matches!(
            norm(r#"{"connections": {"RBUS3": [{"terminal": "T"}]}}"#),
            Err(ConfigError::MalformedInput(_))
        );
    }

    #[test]
    fn canonical_bus_order() {
        let cfg = norm(
            r#"{"connections": {"SBUS1b": [], "SBUS1": [], "RBUS2": [], "SBUS1a": [], "RBUS1": [], "SBUS2a": []}}"#,
        )
        .unwrap();
        let names: Vec<String> = cfg.connections.keys().map(|bus| bus.to_string()).collect();
        assert_eq!(names, ["RBUS1", "RBUS2", "SBUS1", "SBUS1a", "SBUS1b", "SBUS2a"]);
    }

    #[test]
    fn legacy_flat_document() {
        let cfg = norm(r#"{"RBUS1": ["T"], "sizes": {"OTA_P": 5}}"#).unwrap();
        assert_eq!(cfg.connections[&rbus(1)], [conn("T", ConnectionMode::On)]);
        assert_eq!(cfg.sizes[DeviceId::from_idx(0)], 5);
    }

    #[test]
    fn sizes() {
        let cfg = norm(r#"{"sizes": {"OTA_P": 5, "CC_N": "31", "OTA_N": [ 2 ], "CC_P": " 0 "}}"#)
            .unwrap();
        assert_eq!(cfg.sizes.len(), 24);
        let size = |name| cfg.sizes[DeviceId::from_name(name).unwrap()];
        assert_eq!(size("OTA_P"), 5);
        assert_eq!(size("CC_N"), 31);
        assert_eq!(size("OTA_N"), 2);
        assert_eq!(size("CC_P"), 0);
        assert_eq!(size("DINV1_L"), 0);
        assert!(cfg.connections.is_empty());
    }

    #[test]
    fn invalid_sizes() {
        for raw in ["32", "-1", "2.5", "\"abc\"", "[]", "[1, 2]", "null", "true", "\"3.0\""] {
            let text = format!(r#"{{"sizes": {{"OTA_P": {raw}}}}}"#);
            assert_matches!(
                norm(&text),
                Err(ConfigError::InvalidSize { path, .. }) if path == "sizes.OTA_P",
                "{raw}"
            );
        }
        assert_eq!(
            norm(r#"{"sizes": {"OTA_X": 1}}"#),
            Err(ConfigError::UnknownDevice("OTA_X".into()))
        );
    }

    #[test]
    fn errors() {
        assert_matches!(norm("[]"), Err(ConfigError::MalformedInput(_)));
        assert_matches!(norm(r#"{"connections": []}"#), Err(ConfigError::MalformedInput(_)));
        assert_matches!(norm(r#"{"connections": null}"#), Err(ConfigError::MalformedInput(_)));
        assert_matches!(norm(r#"{"sizes": [1]}"#), Err(ConfigError::MalformedInput(_)));
        assert_eq!(
            norm(r#"{"connections": {"SBUS7a": []}}"#),
            Err(ConfigError::UnknownBusName("SBUS7a".into()))
        );
        assert_eq!(
            norm(r#"{"connections": {"GND": []}}"#),
            Err(ConfigError::UnknownBusName("GND".into()))
        );
        assert_matches!(
            norm(r#"{"connections": {"SBUS1a": "T"}}"#),
            Err(ConfigError::MalformedInput(_))
        );
        assert_eq!(
            norm(r#"{"connections": {"SBUS1a": ["T", "X@ON"]}}"#),
            Err(ConfigError::UnknownTerminal {
                path: "connections.SBUS1a[1]".into(),
                terminal: "X".into(),
            })
        );
        assert_eq!(
            norm(r#"{"connections": {"SBUS1a": ["T@PHI3"]}}"#),
            Err(ConfigError::InvalidMode {
                path: "connections.SBUS1a[0]".into(),
                mode: "PHI3".into(),
            })
        );
        assert_matches!(
            norm(r#"{"connections": {"SBUS1a": [{"terminal": "T", "connection": "HALF"}]}}"#),
            Err(ConfigError::InvalidMode { .. })
        );
        assert_matches!(
            norm(r#"{"connections": {"SBUS1a": [{"terminal": "T", "connection": 1}]}}"#),
            Err(ConfigError::InvalidMode { .. })
        );
        assert_matches!(
            norm(r#"{"connections": {"SBUS1a": [{"terminal": "T@HALF", "connection": "ON"}]}}"#),
            Err(ConfigError::InvalidMode { mode, .. }) if mode == "HALF"
        );
        assert_matches!(
            norm(r#"{"connections": {"SBUS1a": [{"connection": "ON"}]}}"#),
            Err(ConfigError::MalformedInput(msg)) if msg.contains("terminal")
        );
        assert_matches!(
            norm(r#"{"connections": {"SBUS1a": [3]}}"#),
            Err(ConfigError::MalformedInput(_))
        );
    }

    #[test]
    fn hand_built() {
        let mut cfg = CanonicalConfig::new().with_size(DeviceId::from_idx(3), 7);
        cfg.push(rbus(2), "T", ConnectionMode::Off);
        cfg.push(sbus(1, None), "U", ConnectionMode::Phi1);
        assert_eq!(
            cfg.iter_connections().collect::<Vec<_>>(),
            [
                (rbus(2), &conn("T", ConnectionMode::On)),
                (sbus(1, None), &conn("U", ConnectionMode::Phi1)),
            ]
        );
        assert_eq!(cfg.sizes[DeviceId::from_idx(3)], 7);
    }
}
