/// Logging macro with explicit level selection.
///
/// Outside of tests it forwards to [`tracing`] macros, so applications decide
/// where SDK diagnostics go by installing a subscriber.
/// During tests it prints to `stdout`, preserving the log level for context.
///
/// # Examples
/// ```
/// use guilded::sdk_log;
/// # fn main() {
/// sdk_log!(info, "dispatching {} frames", 42);
/// sdk_log!(warn, "dropped frame for {}", "ChatMessageCreated");
/// # }
/// ```
#[macro_export]
macro_rules! sdk_log {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(not(test))]
        $crate::__private::tracing::$level!($($arg)*);
        #[cfg(test)]
        println!("[{}] {}", stringify!($level), format_args!($($arg)*));
    };
}
