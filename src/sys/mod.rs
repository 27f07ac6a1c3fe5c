//! Platform backends.
//!
//! Exactly one concrete implementation is compiled per target; the two share
//! no state, and both expose the same `TermState` surface: open (snapshot +
//! apply raw), restore, non-blocking single-byte read, and window-size query.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::TermState;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use self::windows::TermState;
