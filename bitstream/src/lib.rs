use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;
use log::{trace, warn};

mod shift;
mod text;

pub use shift::{ShiftError, ShiftSink, shift_out};
pub use text::{BitFile, BitFileParserError, BitFileParserOptions, Order};

/// What to do when a register is written twice with different values.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ConflictPolicy {
    /// The first disagreeing write fails.
    #[default]
    Strict,
    /// The last write wins and the disagreement is logged.  Not safe for programming hardware
    /// without reviewing the log.
    Overwrite,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum WriteError {
    OutOfRange {
        register: u32,
        len: usize,
        source: String,
    },
    ConflictingWrite {
        register: u32,
        value: bool,
        source: String,
        previous_value: bool,
        previous_source: String,
    },
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::OutOfRange {
                register,
                len,
                source,
            } => write!(f, "{source}: register {register} out of range 1..{len}"),
            WriteError::ConflictingWrite {
                register,
                value,
                source,
                previous_value,
                previous_source,
            } => write!(
                f,
                "{source}: conflicting write for register {register} ({} -> {}, previous source: {previous_source})",
                u8::from(*previous_value),
                u8::from(*value),
            ),
        }
    }
}

impl std::error::Error for WriteError {}

/// A configuration vector under construction.
///
/// Registers are numbered from 1.  Every write is recorded with a short description of its
/// origin so that disagreeing writes can be reported with both culprits.
#[derive(Clone, Debug)]
pub struct Bitstream {
    bits: BitVec,
    sources: Vec<Option<String>>,
    policy: ConflictPolicy,
}

impl Bitstream {
    pub fn new(len: usize) -> Self {
        Bitstream {
            bits: BitVec::repeat(false, len),
            sources: vec![None; len],
            policy: ConflictPolicy::default(),
        }
    }

    pub fn with_policy(self, policy: ConflictPolicy) -> Self {
        Self { policy, ..self }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    fn index(&self, register: u32) -> Option<usize> {
        let idx = usize::try_from(register).ok()?.checked_sub(1)?;
        (idx < self.bits.len()).then_some(idx)
    }

    pub fn get(&self, register: u32) -> Option<bool> {
        self.index(register).map(|idx| self.bits[idx])
    }

    /// Description of the last write to `register`, if it was ever written.
    pub fn source(&self, register: u32) -> Option<&str> {
        self.index(register)
            .and_then(|idx| self.sources[idx].as_deref())
    }

    pub fn put_bit(
        &mut self,
        register: u32,
        val: bool,
        source: impl Into<String>,
    ) -> Result<(), WriteError> {
        let source = source.into();
        let Some(idx) = self.index(register) else {
            return Err(WriteError::OutOfRange {
                register,
                len: self.bits.len(),
                source,
            });
        };
        let cur = self.bits[idx];
        if let Some(prev) = &self.sources[idx] {
            if cur != val {
                match self.policy {
                    ConflictPolicy::Strict => {
                        return Err(WriteError::ConflictingWrite {
                            register,
                            value: val,
                            source,
                            previous_value: cur,
                            previous_source: prev.clone(),
                        });
                    }
                    ConflictPolicy::Overwrite => {
                        warn!(
                            "{source}: overwriting register {register} from {} to {} (previously set by {prev})",
                            u8::from(cur),
                            u8::from(val)
                        );
                    }
                }
            }
        }
        trace!("{source}: register {register} = {}", u8::from(val));
        self.bits.set(idx, val);
        self.sources[idx] = Some(source);
        Ok(())
    }

    /// Registers currently holding 1, ascending.
    pub fn ones(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter_ones().map(|idx| idx as u32 + 1)
    }

    pub fn bits(&self) -> &BitSlice {
        &self.bits
    }

    /// Drops the write provenance, leaving the register values, register 1 first.
    pub fn into_bits(self) -> BitVec {
        self.bits
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn starts_zeroed() {
        let bs = Bitstream::new(16);
        assert_eq!(bs.len(), 16);
        assert_eq!(bs.ones().count(), 0);
        assert_eq!(bs.get(1), Some(false));
        assert_eq!(bs.get(16), Some(false));
        assert_eq!(bs.get(0), None);
        assert_eq!(bs.get(17), None);
        assert_eq!(bs.source(3), None);
    }

    #[test]
    fn agreeing_writes() {
        let mut bs = Bitstream::new(16);
        bs.put_bit(3, true, "first").unwrap();
        bs.put_bit(3, true, "second").unwrap();
        bs.put_bit(4, false, "zero").unwrap();
        bs.put_bit(4, false, "zero again").unwrap();
        assert_eq!(bs.ones().collect::<Vec<_>>(), [3]);
        assert_eq!(bs.source(3), Some("second"));
        assert_eq!(bs.source(4), Some("zero again"));
    }

    #[test]
    fn conflicting_write_names_both_sources() {
        let mut bs = Bitstream::new(16);
        bs.put_bit(5, true, "SBUS SBUS1a T ON").unwrap();
        let err = bs.put_bit(5, false, "SBUS SBUS1a T OFF").unwrap_err();
        assert_eq!(
            err,
            WriteError::ConflictingWrite {
                register: 5,
                value: false,
                source: "SBUS SBUS1a T OFF".into(),
                previous_value: true,
                previous_source: "SBUS SBUS1a T ON".into(),
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("SBUS SBUS1a T ON"));
        assert!(msg.contains("SBUS SBUS1a T OFF"));
        // the failed write leaves the register alone
        assert_eq!(bs.get(5), Some(true));
    }

    #[test]
    fn overwrite_policy() {
        let mut bs = Bitstream::new(16).with_policy(ConflictPolicy::Overwrite);
        bs.put_bit(5, true, "a").unwrap();
        bs.put_bit(5, false, "b").unwrap();
        assert_eq!(bs.get(5), Some(false));
        assert_eq!(bs.source(5), Some("b"));
    }

    #[test]
    fn out_of_range() {
        let mut bs = Bitstream::new(16).with_policy(ConflictPolicy::Overwrite);
        assert_matches!(
            bs.put_bit(0, true, "low"),
            Err(WriteError::OutOfRange { register: 0, len: 16, .. })
        );
        assert_matches!(
            bs.put_bit(17, true, "high"),
            Err(WriteError::OutOfRange { register: 17, .. })
        );
        bs.put_bit(16, true, "last").unwrap();
        assert_eq!(bs.into_bits().last().map(|b| *b), Some(true));
    }
}
