//! Logging macros over the global facade
//!
//! Formatting happens eagerly on the calling thread, so arguments never
//! outlive the statement they appear in.

/// Log at an explicit level with `format!` syntax.
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        $crate::facade::log($level, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::facade::debug(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::facade::info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::facade::warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::facade::error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::facade::fatal(format!($($arg)*))
    };
}

/// Build an attribute list: `attrs! { "user_id" => 42, "region" => "eu" }`.
#[macro_export]
macro_rules! attrs {
    ($($key:expr => $value:expr),* $(,)?) => {
        vec![$(($key.to_string(), $crate::core::field::FieldValue::from($value))),*]
    };
}
