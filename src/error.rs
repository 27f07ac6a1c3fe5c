//! Error taxonomy for raw-mode sessions.
//!
//! Every error is reported synchronously at the call that caused it and none
//! are retried internally: a terminal-attribute call either succeeds or the
//! environment is broken.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermError {
    /// Standard input or output is not a terminal. Raised only by
    /// [`RawSession::open`](crate::RawSession::open); nothing has been
    /// modified when this is returned.
    #[error("standard input/output is not attached to a terminal")]
    HandleResolution,

    /// The current terminal configuration could not be read at open time.
    #[error("failed to read terminal configuration: {0}")]
    ConfigRead(#[source] io::Error),

    /// The raw configuration could not be applied. Anything already applied
    /// has been rolled back; the terminal is unchanged.
    #[error("failed to apply raw terminal configuration: {0}")]
    ConfigWrite(#[source] io::Error),

    /// A genuine I/O fault while reading input. "No byte available" is never
    /// reported through this variant.
    #[error("failed to read from terminal input: {0}")]
    ReadIo(#[source] io::Error),

    /// The OS size query failed.
    #[error("failed to query terminal size: {0}")]
    SizeQuery(#[source] io::Error),

    /// The OS reported a zero column count. Downstream layout cannot operate
    /// on a zero-width terminal, so this is an error rather than a size.
    #[error("terminal reported a zero column count")]
    ZeroColumns,

    /// Restoration failed on close. The terminal may still be in raw mode and
    /// the user's shell unusable; callers must surface this rather than
    /// swallow it.
    #[error("failed to restore original terminal configuration: {0}")]
    Restore(#[source] io::Error),

    /// Another raw-mode session is already open in this process.
    #[error("a raw-mode session is already open in this process")]
    SessionActive,
}

pub type Result<T> = std::result::Result<T, TermError>;
