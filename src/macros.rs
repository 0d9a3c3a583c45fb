/// Emits a `tracing` event at TRACE level when the `tracing` feature is enabled.
macro_rules! _trace {
    ($($tt:tt)+) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($tt)+);
    };
}
