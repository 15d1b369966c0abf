pub mod bus;
pub mod device;
pub mod equations;
pub mod mode;
pub mod row;

mod error;

pub use bus::{Bus, Phase, Rbus, Sbus, SbusLine};
pub use device::DeviceId;
pub use equations::NUM_REGISTERS;
pub use error::AddressError;
pub use mode::ConnectionMode;
pub use row::{InternalRow, SwitchRow};
