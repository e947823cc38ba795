//! Platform-specific helpers.
//! Hides Unix/Windows differences for the log file and config template writers.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{open_log_file_secure_append, write_new_file_0600};

#[cfg(not(unix))]
pub use windows::{open_log_file_secure_append, write_new_file_0600};
