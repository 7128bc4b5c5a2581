//! Sink implementations
//!
//! Contains DailyFileSink.

mod daily;

pub use self::daily::DailyFileSink;
