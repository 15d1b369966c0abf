use unnamed_entity::{EntityId, entity_id};

entity_id! {
    pub id DeviceId u8;
}

/// The sizable devices, in sizing register order.
pub const DEVICE_NAMES: [&str; 24] = [
    "OTA_P", "DCC1_P_L", "DCC1_P_R", "DCC2_P_L", "DCC2_P_R", "DCC3_P_L", "DCC3_P_R", "DCC4_P_L",
    "DCC4_P_R", "CC_N", "CC_P", "DINV1_L", "DINV1_R", "DINV2_L", "DINV2_R", "DCC1_N_L", "DCC1_N_R",
    "DCC2_N_L", "DCC2_N_R", "DCC3_N_L", "DCC3_N_R", "DCC4_N_L", "DCC4_N_R", "OTA_N",
];

pub const NUM_DEVICES: usize = DEVICE_NAMES.len();

/// Bit weights of a size value, LSB first.
pub const SIZE_WEIGHTS: [u32; 5] = [1, 2, 4, 8, 16];

pub const MAX_SIZE: u8 = 31;

impl DeviceId {
    pub fn from_name(name: &str) -> Option<Self> {
        DEVICE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(DeviceId::from_idx)
    }

    pub fn name(self) -> &'static str {
        DEVICE_NAMES[self.to_idx()]
    }

    pub fn all() -> impl Iterator<Item = DeviceId> {
        (0..NUM_DEVICES).map(DeviceId::from_idx)
    }
}

/// Position of `weight` within [`SIZE_WEIGHTS`].
pub fn weight_bit_index(weight: u32) -> Option<usize> {
    SIZE_WEIGHTS.iter().position(|&w| w == weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_lookup() {
        assert_eq!(DeviceId::from_name("OTA_P"), Some(DeviceId::from_idx(0)));
        assert_eq!(DeviceId::from_name("CC_N"), Some(DeviceId::from_idx(9)));
        assert_eq!(DeviceId::from_name("OTA_N"), Some(DeviceId::from_idx(23)));
        assert_eq!(DeviceId::from_name("ota_p"), None);
        for dev in DeviceId::all() {
            assert_eq!(DeviceId::from_name(dev.name()), Some(dev));
        }
    }

    #[test]
    fn weights() {
        assert_eq!(weight_bit_index(1), Some(0));
        assert_eq!(weight_bit_index(16), Some(4));
        assert_eq!(weight_bit_index(3), None);
        assert_eq!(weight_bit_index(32), None);
    }
}
