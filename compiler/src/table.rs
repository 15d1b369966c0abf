use std::collections::BTreeSet;
use std::path::Path;

use itertools::Itertools;
use mosbius_types::ConnectionMode;

use crate::config::CanonicalConfig;
use crate::error::ConfigError;
use crate::pinmap::PinNumbers;

/// A human-readable terminal × bus overview of a configuration.
///
/// Rows are the referenced terminals ordered by package pin, columns the referenced buses in
/// canonical order.  RBUS cells are `1`/`0`, SBUS cells are the connection mode (`ON`, `OFF`,
/// `PH1`, `PH2`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ConnectionTable {
    pub fn new(config: &CanonicalConfig, numbers: &PinNumbers) -> Result<Self, ConfigError> {
        let terminals: BTreeSet<&str> = config
            .iter_connections()
            .map(|(_, conn)| conn.terminal.as_str())
            .collect();
        let terminals: Vec<(u32, &str)> = terminals
            .into_iter()
            .map(|terminal| match numbers.get(terminal) {
                Some(pin) => Ok((pin, terminal)),
                None => Err(ConfigError::UnknownTerminal {
                    path: "pin number map".into(),
                    terminal: terminal.to_string(),
                }),
            })
            .collect::<Result<_, _>>()?;

        let header = std::iter::once("pin".to_string())
            .chain(config.connections.keys().map(|bus| bus.to_string()))
            .collect();

        let rows = terminals
            .into_iter()
            .sorted_by_key(|&(pin, _)| pin)
            .map(|(pin, terminal)| {
                let mut row = vec![format!("{pin}:{terminal}")];
                for (bus, conns) in &config.connections {
                    let mut attached = conns.iter().filter(|conn| conn.terminal == terminal);
                    row.push(if bus.is_rbus() {
                        String::from(if attached.next().is_some() { "1" } else { "0" })
                    } else {
                        attached
                            .last()
                            .map_or(ConnectionMode::Off, |conn| conn.mode)
                            .short_name()
                            .to_string()
                    });
                }
                row
            })
            .collect();

        Ok(ConnectionTable { header, rows })
    }

    /// Comma-separated text, header line first.
    pub fn emit_csv(&self) -> String {
        let mut res = String::new();
        for line in std::iter::once(&self.header).chain(&self.rows) {
            res.push_str(&line.iter().join(","));
            res.push('\n');
        }
        res
    }

    pub fn emit_to_file(&self, fname: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(fname, self.emit_csv())
    }
}
