//! rawtty - scoped raw-mode terminal sessions
//!
//! rawtty puts the process's controlling terminal into raw mode for the
//! lifetime of a [`RawSession`] and exposes three primitives on top of it:
//!
//! - **Non-blocking reads**: [`RawSession::read_byte`] returns immediately,
//!   with or without a byte
//! - **Size queries**: [`RawSession::size`] reports the current rows/columns
//! - **Guaranteed restoration**: the original configuration is reapplied when
//!   the session ends, on every exit path
//!
//! Higher layers (escape-sequence emission, key decoding, widgets) are out of
//! scope and build on these primitives.
//!
//! # Quick start
//!
//! ```no_run
//! use rawtty::RawSession;
//!
//! fn main() -> rawtty::Result<()> {
//!     let mut session = RawSession::open(true)?;
//!     let size = session.size()?;
//!     print!("{} rows x {} cols\r\n", size.rows, size.cols);
//!     loop {
//!         match session.read_byte()? {
//!             Some(b'q') => break,
//!             Some(byte) => print!("0x{byte:02X}\r\n"),
//!             None => std::thread::sleep(std::time::Duration::from_millis(10)),
//!         }
//!     }
//!     session.close()
//! }
//! ```
//!
//! # Caveats
//!
//! - Standard input and output must be real terminals; opening fails cleanly
//!   when either is redirected to a pipe or file.
//! - One session per process: a second concurrent [`RawSession::open`] is
//!   rejected with [`TermError::SessionActive`].
//! - A [`RawSession::close`] failure means the terminal may be stuck in raw
//!   mode; propagate it to the top instead of swallowing it.

mod error;
mod session;
mod sys;

pub use error::{Result, TermError};
pub use session::{RawSession, TermSize};
