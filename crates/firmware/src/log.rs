//! Tagged logging shorthands over [`platform::LogSink`].
//!
//! `log_info!(self.log, TAG, "...")` expands to a single `LogSink::log` call with
//! `format_args!`, so nothing is allocated on the way to the sink.

macro_rules! emit {
    ($level:ident, $sink:expr, $tag:expr, $($arg:tt)+) => {{
        use ::platform::LogSink as _;
        $sink.log(::platform::LogLevel::$level, $tag, format_args!($($arg)+))
    }};
}

macro_rules! log_debug {
    ($sink:expr, $tag:expr, $($arg:tt)+) => { emit!(Debug, $sink, $tag, $($arg)+) };
}

macro_rules! log_info {
    ($sink:expr, $tag:expr, $($arg:tt)+) => { emit!(Info, $sink, $tag, $($arg)+) };
}

macro_rules! log_warn {
    ($sink:expr, $tag:expr, $($arg:tt)+) => { emit!(Warn, $sink, $tag, $($arg)+) };
}

macro_rules! log_error {
    ($sink:expr, $tag:expr, $($arg:tt)+) => { emit!(Error, $sink, $tag, $($arg)+) };
}
