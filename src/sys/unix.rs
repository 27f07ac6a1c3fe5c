//! POSIX termios backend.
//!
//! The terminal's line discipline lives in a single `termios` structure, so
//! one `tcgetattr` snapshot and one `tcsetattr` restore are all that is needed
//! for exact round-tripping. The raw variant drops canonical mode, echo, and
//! input preprocessing, and sets `VMIN=0`/`VTIME=0` so `read(2)` returns
//! immediately when no byte is pending.
//!
//! The workers here take the file descriptor as a parameter; the public
//! `TermState` binds them to the process's standard streams, and the tests
//! run the same code against the slave side of a PTY pair instead.

use std::io;

use rustix::fd::AsFd;
use rustix::termios::{
    self, ControlModes, InputModes, LocalModes, OptionalActions, SpecialCodeIndex, Termios,
};

use crate::error::{Result, TermError};
use crate::session::TermSize;

/// Termios snapshot captured when the session opened.
pub(crate) struct TermState {
    saved: Termios,
}

impl TermState {
    pub(crate) fn open(suppress_interrupts: bool) -> Result<Self> {
        let stdin = io::stdin();
        if !termios::isatty(&stdin) || !termios::isatty(&io::stdout()) {
            return Err(TermError::HandleResolution);
        }
        let saved = enter_raw(&stdin, suppress_interrupts)?;
        Ok(Self { saved })
    }

    pub(crate) fn restore(&self) -> Result<()> {
        restore(&io::stdin(), &self.saved)
    }

    pub(crate) fn read_byte(&self) -> Result<Option<u8>> {
        read_byte(&io::stdin())
    }

    pub(crate) fn window_size(&self) -> Result<TermSize> {
        window_size(&io::stdout())
    }
}

/// Snapshots the configuration on `fd`, then applies the raw variant.
///
/// Returns the snapshot for later restoration. Output post-processing
/// (`OPOST`) is deliberately left enabled so `\n` still renders as a newline;
/// higher layers that emit escape sequences rely on it.
fn enter_raw(fd: impl AsFd, suppress_interrupts: bool) -> Result<Termios> {
    let saved = termios::tcgetattr(&fd).map_err(|e| TermError::ConfigRead(e.into()))?;

    let mut raw = saved.clone();
    raw.input_modes.remove(
        InputModes::BRKINT
            | InputModes::ICRNL
            | InputModes::INPCK
            | InputModes::ISTRIP
            | InputModes::IXON,
    );
    raw.control_modes.insert(ControlModes::CS8);
    raw.local_modes
        .remove(LocalModes::ECHO | LocalModes::ICANON | LocalModes::IEXTEN);
    if suppress_interrupts {
        raw.local_modes.remove(LocalModes::ISIG);
    }
    // VMIN=0/VTIME=0: read(2) returns immediately with whatever is pending.
    raw.special_codes[SpecialCodeIndex::VMIN] = 0;
    raw.special_codes[SpecialCodeIndex::VTIME] = 0;

    termios::tcsetattr(&fd, OptionalActions::Flush, &raw)
        .map_err(|e| TermError::ConfigWrite(e.into()))?;
    Ok(saved)
}

fn restore(fd: impl AsFd, saved: &Termios) -> Result<()> {
    termios::tcsetattr(&fd, OptionalActions::Flush, saved)
        .map_err(|e| TermError::Restore(e.into()))
}

fn read_byte(fd: impl AsFd) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match rustix::io::read(&fd, &mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e) if e == rustix::io::Errno::AGAIN => Ok(None),
        Err(e) => Err(TermError::ReadIo(e.into())),
    }
}

fn window_size(fd: impl AsFd) -> Result<TermSize> {
    let ws = termios::tcgetwinsize(&fd).map_err(|e| TermError::SizeQuery(e.into()))?;
    if ws.ws_col == 0 {
        return Err(TermError::ZeroColumns);
    }
    Ok(TermSize {
        rows: ws.ws_row,
        cols: ws.ws_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::fd::OwnedFd;
    use std::time::Duration;

    use rustix::pty::{grantpt, openpt, ptsname, unlockpt, OpenptFlags};
    use rustix::termios::{tcsetwinsize, Winsize};

    fn pty_pair() -> (OwnedFd, fs::File) {
        let master = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY).expect("openpt");
        grantpt(&master).expect("grantpt");
        unlockpt(&master).expect("unlockpt");
        let path = ptsname(&master, Vec::new())
            .expect("ptsname")
            .into_string()
            .expect("pts path is utf-8");
        let slave = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .expect("open pts");
        (master, slave)
    }

    // Delivery through the pty line discipline is not instantaneous; give the
    // byte a moment to arrive before declaring it absent.
    fn read_byte_eventually(fd: &fs::File) -> Option<u8> {
        for _ in 0..100 {
            if let Some(b) = read_byte(fd).expect("read_byte") {
                return Some(b);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        None
    }

    #[test]
    fn raw_config_disables_line_discipline() {
        let (_master, slave) = pty_pair();
        enter_raw(&slave, false).expect("enter raw");

        let cur = termios::tcgetattr(&slave).expect("tcgetattr");
        assert!(!cur.local_modes.contains(LocalModes::ICANON));
        assert!(!cur.local_modes.contains(LocalModes::ECHO));
        assert!(!cur.local_modes.contains(LocalModes::IEXTEN));
        // Interrupt characters keep their default behavior unless asked for.
        assert!(cur.local_modes.contains(LocalModes::ISIG));
        assert!(!cur.input_modes.intersects(
            InputModes::BRKINT
                | InputModes::ICRNL
                | InputModes::INPCK
                | InputModes::ISTRIP
                | InputModes::IXON
        ));
        assert!(cur.control_modes.contains(ControlModes::CS8));
        assert_eq!(cur.special_codes[SpecialCodeIndex::VMIN], 0);
        assert_eq!(cur.special_codes[SpecialCodeIndex::VTIME], 0);
    }

    #[test]
    fn suppressing_interrupts_clears_isig() {
        let (_master, slave) = pty_pair();
        enter_raw(&slave, true).expect("enter raw");

        let cur = termios::tcgetattr(&slave).expect("tcgetattr");
        assert!(!cur.local_modes.contains(LocalModes::ISIG));
    }

    #[test]
    fn restore_returns_exact_original_configuration() {
        let (_master, slave) = pty_pair();
        let before = termios::tcgetattr(&slave).expect("tcgetattr before");

        let saved = enter_raw(&slave, true).expect("enter raw");
        restore(&slave, &saved).expect("restore");

        let after = termios::tcgetattr(&slave).expect("tcgetattr after");
        assert_eq!(before.input_modes, after.input_modes);
        assert_eq!(before.output_modes, after.output_modes);
        assert_eq!(before.control_modes, after.control_modes);
        assert_eq!(before.local_modes, after.local_modes);
        assert_eq!(
            before.special_codes[SpecialCodeIndex::VMIN],
            after.special_codes[SpecialCodeIndex::VMIN]
        );
        assert_eq!(
            before.special_codes[SpecialCodeIndex::VTIME],
            after.special_codes[SpecialCodeIndex::VTIME]
        );
    }

    #[test]
    fn read_is_nonblocking_and_returns_submitted_bytes() {
        let (master, slave) = pty_pair();
        enter_raw(&slave, false).expect("enter raw");

        assert_eq!(read_byte(&slave).expect("idle read"), None);

        rustix::io::write(&master, b"A").expect("write to master");
        assert_eq!(read_byte_eventually(&slave), Some(b'A'));
        assert_eq!(read_byte(&slave).expect("drained read"), None);
    }

    #[test]
    fn interrupt_byte_is_delivered_when_suppressed() {
        let (master, slave) = pty_pair();
        enter_raw(&slave, true).expect("enter raw");

        rustix::io::write(&master, &[0x03]).expect("write ctrl-c");
        assert_eq!(read_byte_eventually(&slave), Some(0x03));
    }

    #[test]
    fn window_size_reflects_current_dimensions_and_rejects_zero_width() {
        let (_master, slave) = pty_pair();

        let zero = Winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        tcsetwinsize(&slave, zero).expect("tcsetwinsize zero");
        assert!(matches!(window_size(&slave), Err(TermError::ZeroColumns)));

        let sized = Winsize {
            ws_row: 24,
            ws_col: 80,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        tcsetwinsize(&slave, sized).expect("tcsetwinsize 80x24");
        let size = window_size(&slave).expect("window size");
        assert_eq!((size.rows, size.cols), (24, 80));

        // No staleness: a resize between calls is visible on the next query.
        let resized = Winsize {
            ws_row: 50,
            ws_col: 132,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        tcsetwinsize(&slave, resized).expect("tcsetwinsize 132x50");
        let size = window_size(&slave).expect("window size after resize");
        assert_eq!((size.rows, size.cols), (50, 132));
    }
}
