/// Traces a request on the `wallet::rpc` target.
///
/// Emits at `debug` when the wallet was built with `debug` enabled, at `trace` otherwise.
macro_rules! rpc_trace {
    ($debug:expr, $($arg:tt)*) => {
        if $debug {
            ::tracing::debug!(target: $crate::logging::RPC_TARGET, $($arg)*);
        } else {
            ::tracing::trace!(target: $crate::logging::RPC_TARGET, $($arg)*);
        }
    };
}

pub(crate) use rpc_trace;
