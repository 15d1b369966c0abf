//! Turns MOSbius connection documents into configuration bitstreams.
//!
//! The pipeline is [`CanonicalConfig::normalize`] (document and pin map in, validated model
//! out), then [`build_bitstream`] (model in, [`Bitstream`] out).  [`compile`] runs both.

use jzon::JsonValue;
use mosbius_bitstream::Bitstream;

mod builder;
mod config;
mod error;
mod json;
mod pinmap;
pub mod regmap;
mod table;

pub use builder::{BuildOptions, build_bitstream};
pub use config::{CanonicalConfig, Connection, Sizes};
pub use error::{ConfigError, Error};
pub use json::parse_json;
pub use pinmap::{PinMap, PinNumbers};
pub use table::ConnectionTable;

/// Normalizes a connection document and builds its bitstream.  Nothing is written unless the
/// whole document is valid.
pub fn compile(doc: &JsonValue, pins: &PinMap, options: &BuildOptions) -> Result<Bitstream, Error> {
    let config = CanonicalConfig::normalize(doc, pins)?;
    build_bitstream(&config, pins, options)
}
