//! The seam between the wallet and whatever it calls into.

use rust_decimal::Decimal;
use sharegate_types::{Address, Result};

/// Performs a queued call once the wallet's threshold is met.
///
/// `origin` is the wallet's own address: the callee sees the wallet, not
/// the confirming owner, as its caller. Returning `Err` leaves the
/// transaction unexecuted and retryable.
pub trait CallExecutor {
    fn execute_call(
        &mut self,
        origin: Address,
        target: Address,
        value: Decimal,
        payload: &[u8],
    ) -> Result<()>;
}

/// Accepts every call and records it. Useful when the wallet is driven
/// without a live target.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub calls: Vec<(Address, Decimal, Vec<u8>)>,
}

impl CallExecutor for RecordingExecutor {
    fn execute_call(
        &mut self,
        _origin: Address,
        target: Address,
        value: Decimal,
        payload: &[u8],
    ) -> Result<()> {
        self.calls.push((target, value, payload.to_vec()));
        Ok(())
    }
}
