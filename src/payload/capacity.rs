//! Pre-flight capacity accounting.
//!
//! One payload bit occupies one embeddable unit: a carrier byte for LSB
//! targets, an eligible coefficient for DCT targets. LSB targets check this
//! before the first byte is mutated; DCT targets count eligible coefficients
//! by scanning first and then run the same check.

use crate::error::StegoError;
use crate::result::Result;

pub fn ensure_fits(required_bits: usize, available_units: usize) -> Result<()> {
    if required_bits > available_units {
        return Err(StegoError::CapacityExceeded {
            required: required_bits,
            available: available_units,
        });
    }
    Ok(())
}
