use thiserror::Error;

/// Errors raised by the statistics and trend computations.
///
/// Both are terminal for the computation that produced them: the inputs are
/// plain in-memory sequences, so repeating the call gives the same outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    /// Fewer non-missing data points than the statistic needs.
    #[error("insufficient data: need at least {required} values, but have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Two series meant to be paired by index have different lengths.
    #[error("misaligned input: series lengths {x_len} and {y_len} differ")]
    MisalignedInput { x_len: usize, y_len: usize },
}
