/// A monotonic tick source used to time batches of operations.
pub trait Clock {
    /// Current tick count. Never decreases.
    fn now(&self) -> u64;

    /// Ticks per second.
    fn frequency(&self) -> u64;

    /// Milliseconds between two readings of [`now`](Self::now).
    #[allow(clippy::cast_precision_loss)]
    fn elapsed_ms(&self, start: u64, end: u64) -> f64 {
        end.saturating_sub(start) as f64 * 1000.0 / self.frequency() as f64
    }
}
