/// Monotonic millisecond time source, e.g. a systick counter.
///
/// The driver only ever subtracts two readings with wrapping arithmetic, so the counter may
/// start anywhere and roll over after ~49 days.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed point in the past
    fn now_ms(&mut self) -> u32;
}

impl<F> Clock for F
where
    F: FnMut() -> u32,
{
    fn now_ms(&mut self) -> u32 {
        self()
    }
}
