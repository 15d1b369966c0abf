//! Closed-form register addresses for the switch matrix and the sizing chain.
//!
//! The configuration chain is 2008 registers long, numbered from 1.  It consists of four
//! switch-matrix banks of 472 registers followed by 120 sizing registers.  Each bank serves
//! 24 equation slots (23 numeric rows and one internal row) and is laid out as:
//!
//! - 288 SBUS registers: 6 lines × 24 slots × 2 phases, phase bits of one slot adjacent,
//! - 184 RBUS registers: 8 lines × 23 slots (internal rows have no RBUS switches).
//!
//! The sizing chain has 5 registers per device, LSB first.

use core::ops::RangeInclusive;

use unnamed_entity::EntityId;

use crate::device::{DeviceId, NUM_DEVICES, SIZE_WEIGHTS, weight_bit_index};
use crate::{AddressError, InternalRow, Phase, Rbus, Sbus, SwitchRow};

pub const NUM_REGISTERS: u32 = 2008;

pub const SBUS_REGISTERS: RangeInclusive<u32> = 1..=1704;
pub const RBUS_REGISTERS: RangeInclusive<u32> = 289..=1888;
pub const SIZING_REGISTERS: RangeInclusive<u32> = 1889..=2008;

pub const NUM_NUMERIC_ROWS: u32 = 92;
pub const NUM_BANKS: u32 = 4;
const ROWS_PER_BANK: u32 = 23;
const SLOTS_PER_BANK: u32 = 24;

const BANK_STRIDE: u32 = 472;
const SBUS_BASE: u32 = 1;
const SBUS_LINE_STRIDE: u32 = 48;
const RBUS_BASE: u32 = 289;
const RBUS_LINE_STRIDE: u32 = 23;
const SIZING_BASE: u32 = 1889;
const SIZING_DEVICE_STRIDE: u32 = 5;

/// Maps a switch row to its equation index `s` in 1..=96.
pub fn switch_equation_index(row: SwitchRow) -> Result<u32, AddressError> {
    match row {
        SwitchRow::Internal(row) => Ok((row.bank() + 1) * SLOTS_PER_BANK),
        SwitchRow::Numeric(n) => {
            if !(1..=NUM_NUMERIC_ROWS).contains(&n) {
                return Err(AddressError::RowOutOfRange(n.to_string()));
            }
            let bank = (n - 1) / ROWS_PER_BANK;
            let slot = (n - 1) % ROWS_PER_BANK + 1;
            Ok(bank * SLOTS_PER_BANK + slot)
        }
    }
}

/// Splits an equation index into (bank, slot), with slot in 1..=24.
fn bank_slot(s: u32) -> (u32, u32) {
    ((s - 1) / SLOTS_PER_BANK, (s - 1) % SLOTS_PER_BANK + 1)
}

pub fn sbus_address(row: SwitchRow, sbus: Sbus) -> Result<u32, AddressError> {
    let (bank, slot) = bank_slot(switch_equation_index(row)?);
    let idx = slot - 1;
    let n = u32::from(sbus.line.index());
    let phase = match sbus.phase {
        Phase::A => 0,
        Phase::B => 1,
    };
    Ok(SBUS_BASE + BANK_STRIDE * bank + 2 * idx + SBUS_LINE_STRIDE * (n - 1) + phase)
}

pub fn rbus_address(row: SwitchRow, rbus: Rbus) -> Result<u32, AddressError> {
    let (bank, slot) = rbus_bank_slot(row)?;
    let m = u32::from(rbus.index());
    Ok(RBUS_BASE + BANK_STRIDE * bank + (slot - 1) + RBUS_LINE_STRIDE * (m - 1))
}

fn rbus_bank_slot(row: SwitchRow) -> Result<(u32, u32), AddressError> {
    let (bank, slot) = bank_slot(switch_equation_index(row)?);
    if slot == SLOTS_PER_BANK {
        return Err(AddressError::UndefinedForInternalRow(
            InternalRow::ALL[bank as usize],
        ));
    }
    Ok((bank, slot))
}

/// Register of an SBUS switch, with the bus given by name (`SBUS1a`..`SBUS6b`).
pub fn sbus_register(row: SwitchRow, bus: &str) -> Result<u32, AddressError> {
    switch_equation_index(row)?;
    sbus_address(row, bus.parse()?)
}

/// Register of an RBUS switch, with the bus given by name (`RBUS1`..`RBUS8`).
///
/// Internal rows are rejected before the bus name is looked at.
pub fn rbus_register(row: SwitchRow, bus: &str) -> Result<u32, AddressError> {
    rbus_bank_slot(row)?;
    rbus_address(row, bus.parse()?)
}

/// Dispatches on the bus family prefix.
pub fn switch_register(row: SwitchRow, bus: &str) -> Result<u32, AddressError> {
    if bus.starts_with("SBUS") {
        sbus_register(row, bus)
    } else if bus.starts_with("RBUS") {
        rbus_register(row, bus)
    } else {
        Err(AddressError::InvalidBusName(bus.to_string()))
    }
}

pub fn sizing_register_by_index(device: DeviceId, bit_index: usize) -> Result<u32, AddressError> {
    let d = device.to_idx();
    if d >= NUM_DEVICES {
        return Err(AddressError::UnknownDevice(d.to_string()));
    }
    if bit_index >= SIZE_WEIGHTS.len() {
        // reported as the weight the index would stand for
        return Err(AddressError::InvalidWeight(1u32 << bit_index.min(31)));
    }
    Ok(SIZING_BASE + SIZING_DEVICE_STRIDE * d as u32 + bit_index as u32)
}

pub fn sizing_address(device: DeviceId, weight: u32) -> Result<u32, AddressError> {
    let bit_index = weight_bit_index(weight).ok_or(AddressError::InvalidWeight(weight))?;
    sizing_register_by_index(device, bit_index)
}

/// Register of one weighted bit of a device's size.
pub fn sizing_register(device: &str, weight: u32) -> Result<u32, AddressError> {
    let device =
        DeviceId::from_name(device).ok_or_else(|| AddressError::UnknownDevice(device.to_string()))?;
    sizing_address(device, weight)
}

/// All (weight, register) pairs of a device, LSB first.
pub fn sizing_registers_for_device(device: &str) -> Result<[(u32, u32); 5], AddressError> {
    let mut res = [(0, 0); 5];
    for (i, &weight) in SIZE_WEIGHTS.iter().enumerate() {
        res[i] = (weight, sizing_register(device, weight)?);
    }
    Ok(res)
}
