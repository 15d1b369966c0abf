use bitvec::slice::BitSlice;

/// The three control lines of the configuration shift register.
///
/// Implementations drive the enable, clock and data pins of whatever is attached to the chip.
/// Line setup (data, clock and enable low) is the implementation's business.
pub trait ShiftSink {
    type Error;

    /// Drives the data line.
    fn set_bit(&mut self, val: bool) -> Result<(), Self::Error>;

    /// One full clock cycle, shifting the data line into the chain.
    fn pulse_clock(&mut self) -> Result<(), Self::Error>;

    /// Raises the enable line, latching the shifted configuration.
    fn finish(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub enum ShiftError<E> {
    Empty,
    Sink(E),
}

impl<E: std::fmt::Display> std::fmt::Display for ShiftError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftError::Empty => write!(f, "bitstream is empty"),
            ShiftError::Sink(error) => write!(f, "{error}"),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for ShiftError<E> {}

/// Shifts a configuration vector (register 1 first) into the chain.  The last register goes
/// in first, so that after the final clock every register sits in its own stage.
pub fn shift_out<S: ShiftSink>(bits: &BitSlice, sink: &mut S) -> Result<(), ShiftError<S::Error>> {
    if bits.is_empty() {
        return Err(ShiftError::Empty);
    }
    for bit in bits.iter().by_vals().rev() {
        sink.set_bit(bit).map_err(ShiftError::Sink)?;
        sink.pulse_clock().map_err(ShiftError::Sink)?;
    }
    sink.finish().map_err(ShiftError::Sink)
}
