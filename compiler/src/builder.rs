use log::info;
use mosbius_bitstream::{Bitstream, ConflictPolicy};
use mosbius_types::device::{DEVICE_NAMES, MAX_SIZE, SIZE_WEIGHTS};
use mosbius_types::equations::{rbus_address, sbus_address, sizing_register_by_index};
use mosbius_types::{AddressError, Bus, NUM_REGISTERS};
use unnamed_entity::EntityId;

use crate::config::CanonicalConfig;
use crate::error::{ConfigError, Error};
use crate::pinmap::PinMap;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildOptions {
    pub policy: ConflictPolicy,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(self, policy: ConflictPolicy) -> Self {
        Self { policy }
    }
}

/// Lays a canonical configuration out onto a fresh, zeroed bitstream.
///
/// All connections are written first, then all sizing bits.  Any error aborts the build.
pub fn build_bitstream(
    config: &CanonicalConfig,
    pins: &PinMap,
    options: &BuildOptions,
) -> Result<Bitstream, Error> {
    let mut bs = Bitstream::new(NUM_REGISTERS as usize).with_policy(options.policy);

    for (bus, conn) in config.iter_connections() {
        let terminal = &conn.terminal;
        let row = pins
            .get(terminal)
            .ok_or_else(|| ConfigError::UnknownTerminal {
                path: format!("connections.{bus}"),
                terminal: terminal.clone(),
            })?;
        match bus {
            Bus::Rbus(rbus) => {
                bs.put_bit(rbus_address(row, rbus)?, true, format!("RBUS {rbus} {terminal}"))?;
            }
            Bus::Sbus(..) => {
                for sbus in bus.phases() {
                    bs.put_bit(
                        sbus_address(row, sbus)?,
                        conn.mode.bit(sbus.phase),
                        format!("SBUS {sbus} {terminal} {mode}", mode = conn.mode),
                    )?;
                }
            }
        }
    }

    for (device, &size) in config.sizes.iter() {
        let Some(name) = DEVICE_NAMES.get(device.to_idx()) else {
            return Err(AddressError::UnknownDevice(device.to_idx().to_string()).into());
        };
        if size > MAX_SIZE {
            Err(ConfigError::InvalidSize {
                path: format!("sizes.{name}"),
                value: size.to_string(),
            })?
        }
        for (bit_index, weight) in SIZE_WEIGHTS.into_iter().enumerate() {
            bs.put_bit(
                sizing_register_by_index(device, bit_index)?,
                (size >> bit_index) & 1 != 0,
                format!("sizes {name} bit {weight}"),
            )?;
        }
    }

    info!(
        "built bitstream: {n} registers, {ones} set",
        n = bs.len(),
        ones = bs.ones().count()
    );
    Ok(bs)
}
