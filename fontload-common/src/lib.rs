pub mod log;
pub mod signal;
