use std::fmt::Write;
use std::path::Path;

use bitvec::vec::BitVec;
use itertools::Either;
use log::warn;

/// The order in which registers appear in a bitstream artifact.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Order {
    /// Register 1 first.
    #[default]
    Ascending,
    /// Last register first, as shifted into the chain.
    Descending,
}

impl std::str::FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Ascending),
            "desc" => Ok(Order::Descending),
            _ => Err(format!("order must be 'asc' or 'desc', got {s:?}")),
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Ascending => write!(f, "asc"),
            Order::Descending => write!(f, "desc"),
        }
    }
}

/// A bitstream artifact: one `0`/`1` per line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BitFile {
    /// Register values, register 1 first, regardless of [`Self::order`].
    pub bits: BitVec,
    /// The order registers are written out in.
    pub order: Order,
    /// If true, a single `0` line precedes the data, as expected by older programming
    /// setups.
    pub compat_prefix: bool,
}

#[derive(Clone, Debug, Default)]
pub struct BitFileParserOptions {
    pub order: Order,
    /// If true, the first line is the compatibility prefix and is not part of the data.
    pub compat_prefix: bool,
    /// Register count the caller expects; a different count is only warned about.
    pub expected_len: Option<usize>,
}

impl BitFileParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(self, order: Order) -> Self {
        Self { order, ..self }
    }

    pub fn compat_prefix(self) -> Self {
        Self {
            compat_prefix: true,
            ..self
        }
    }

    pub fn expected_len(self, len: usize) -> Self {
        Self {
            expected_len: Some(len),
            ..self
        }
    }
}

#[derive(Debug)]
pub enum BitFileParserError {
    InvalidBit { line: usize, text: String },
    InvalidPrefix,
    Empty,
    IoError(std::io::Error),
}

impl From<std::io::Error> for BitFileParserError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl std::fmt::Display for BitFileParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitFileParserError::InvalidBit { line, text } => {
                write!(f, "invalid bitstream value {text:?} at line {line}")
            }
            BitFileParserError::InvalidPrefix => write!(f, "compatibility prefix bit is not 0"),
            BitFileParserError::Empty => write!(f, "bitstream is empty"),
            BitFileParserError::IoError(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for BitFileParserError {}

impl BitFile {
    pub fn new() -> Self {
        BitFile::default()
    }

    pub fn with_bits(self, bits: BitVec) -> Self {
        Self { bits, ..self }
    }

    pub fn with_order(self, order: Order) -> Self {
        Self { order, ..self }
    }

    pub fn with_compat_prefix(self, compat_prefix: bool) -> Self {
        Self {
            compat_prefix,
            ..self
        }
    }

    /// The bits as they appear in the artifact, prefix included.
    pub fn ordered_bits(&self) -> impl Iterator<Item = bool> + '_ {
        let data = match self.order {
            Order::Ascending => Either::Left(self.bits.iter().by_vals()),
            Order::Descending => Either::Right(self.bits.iter().by_vals().rev()),
        };
        self.compat_prefix.then_some(false).into_iter().chain(data)
    }

    /// Number of lines in the artifact.
    pub fn num_lines(&self) -> usize {
        self.bits.len() + usize::from(self.compat_prefix)
    }

    pub fn emit(&self) -> String {
        let mut res = String::with_capacity(self.num_lines() * 2);
        for bit in self.ordered_bits() {
            writeln!(res, "{}", u8::from(bit)).unwrap();
        }
        res
    }

    pub fn emit_to_file(&self, fname: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(fname, self.emit())
    }

    pub fn parse(text: &str, options: &BitFileParserOptions) -> Result<Self, BitFileParserError> {
        let mut bits = BitVec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            bits.push(match line {
                "0" => false,
                "1" => true,
                _ => Err(BitFileParserError::InvalidBit {
                    line: i + 1,
                    text: line.to_string(),
                })?,
            });
        }
        if options.compat_prefix {
            if bits.is_empty() {
                Err(BitFileParserError::Empty)?
            }
            if bits.remove(0) {
                Err(BitFileParserError::InvalidPrefix)?
            }
        }
        if bits.is_empty() {
            Err(BitFileParserError::Empty)?
        }
        if options.order == Order::Descending {
            bits.reverse();
        }
        if let Some(expected) = options.expected_len {
            if bits.len() != expected {
                warn!("expected {expected} bits, loaded {n} bits", n = bits.len());
            }
        }
        Ok(BitFile {
            bits,
            order: options.order,
            compat_prefix: options.compat_prefix,
        })
    }

    pub fn parse_from_file(
        fname: impl AsRef<Path>,
        options: &BitFileParserOptions,
    ) -> Result<Self, BitFileParserError> {
        let text = std::fs::read_to_string(fname)?;
        Self::parse(&text, options)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bitvec::prelude::*;

    use super::*;

    fn sample() -> BitVec {
        bitvec![1, 1, 0, 1, 0]
    }

    #[test]
    fn emit_orders() {
        let file = BitFile::new().with_bits(sample());
        assert_eq!(file.emit(), "1\n1\n0\n1\n0\n");
        let file = file.with_order(Order::Descending);
        assert_eq!(file.emit(), "0\n1\n0\n1\n1\n");
        let file = file.with_compat_prefix(true);
        assert_eq!(file.emit(), "0\n0\n1\n0\n1\n1\n");
        assert_eq!(file.num_lines(), 6);
        let file = file.with_order(Order::Ascending);
        assert_eq!(file.ordered_bits().collect::<Vec<_>>(), [false, true, true, false, true, false]);
    }

    #[test]
    fn parse_roundtrip_descending_with_prefix() {
        let file = BitFile::new()
            .with_bits(sample())
            .with_order(Order::Descending)
            .with_compat_prefix(true);
        let options = BitFileParserOptions::new()
            .order(Order::Descending)
            .compat_prefix()
            .expected_len(5);
        assert_eq!(BitFile::parse(&file.emit(), &options).unwrap(), file);
    }

    #[test]
    fn parse_skips_blank_lines_and_whitespace() {
        let file = BitFile::parse("1\n\n 0 \r\n1\n", &BitFileParserOptions::new()).unwrap();
        assert_eq!(file.bits, bitvec![1, 0, 1]);
    }

    #[test]
    fn parse_errors() {
        let options = BitFileParserOptions::new();
        assert_matches!(
            BitFile::parse("1\n0\n2\n", &options),
            Err(BitFileParserError::InvalidBit { line: 3, .. })
        );
        assert_matches!(BitFile::parse("\n\n", &options), Err(BitFileParserError::Empty));
        let options = options.compat_prefix();
        assert_matches!(BitFile::parse("1\n0\n", &options), Err(BitFileParserError::InvalidPrefix));
        assert_matches!(BitFile::parse("0\n", &options), Err(BitFileParserError::Empty));
    }

    #[test]
    fn length_mismatch_is_not_fatal() {
        let options = BitFileParserOptions::new().expected_len(2008);
        let file = BitFile::parse("1\n0\n", &options).unwrap();
        assert_eq!(file.bits.len(), 2);
    }

    #[test]
    fn order_names() {
        assert_eq!("asc".parse::<Order>(), Ok(Order::Ascending));
        assert_eq!(" DESC".parse::<Order>(), Ok(Order::Descending));
        assert!("up".parse::<Order>().is_err());
        assert_eq!(Order::Descending.to_string(), "desc");
    }
}
