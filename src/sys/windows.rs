//! Windows console backend.
//!
//! The console keeps two independent mode words, one per std handle, so the
//! snapshot is a pair of `CONSOLE_MODE` values and restoration is two
//! `SetConsoleMode` calls. The raw input mode drops line input and echo and
//! enables virtual-terminal input; the output mode gains virtual-terminal
//! processing so escape sequences written by higher layers render, plus
//! `DISABLE_NEWLINE_AUTO_RETURN` to keep newline semantics aligned with the
//! POSIX backend.

use std::io;

use windows::Win32::Foundation::HANDLE;
use windows::Win32::Storage::FileSystem::ReadFile;
use windows::Win32::System::Console::{
    GetConsoleMode, GetConsoleScreenBufferInfo, GetNumberOfConsoleInputEvents, GetStdHandle,
    PeekConsoleInputW, ReadConsoleInputW, SetConsoleMode, CONSOLE_MODE,
    CONSOLE_SCREEN_BUFFER_INFO, DISABLE_NEWLINE_AUTO_RETURN, ENABLE_ECHO_INPUT,
    ENABLE_LINE_INPUT, ENABLE_PROCESSED_INPUT, ENABLE_VIRTUAL_TERMINAL_INPUT,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, INPUT_RECORD, KEY_EVENT, STD_INPUT_HANDLE,
    STD_OUTPUT_HANDLE,
};

use crate::error::{Result, TermError};
use crate::session::TermSize;

fn os_error(e: windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(e.code().0 as i32)
}

/// Console handles plus the two mode words captured at open.
pub(crate) struct TermState {
    input: HANDLE,
    output: HANDLE,
    original_input_mode: CONSOLE_MODE,
    original_output_mode: CONSOLE_MODE,
}

// Safety: std handles stay valid for the process lifetime and the session is
// the sole mutator of console modes while it exists.
unsafe impl Send for TermState {}

fn raw_input_mode(original: CONSOLE_MODE, suppress_interrupts: bool) -> CONSOLE_MODE {
    let mut bits = (original.0 | ENABLE_VIRTUAL_TERMINAL_INPUT.0)
        & !(ENABLE_LINE_INPUT.0 | ENABLE_ECHO_INPUT.0);
    if suppress_interrupts {
        bits &= !ENABLE_PROCESSED_INPUT.0;
    }
    CONSOLE_MODE(bits)
}

fn raw_output_mode(original: CONSOLE_MODE) -> CONSOLE_MODE {
    CONSOLE_MODE(original.0 | ENABLE_VIRTUAL_TERMINAL_PROCESSING.0 | DISABLE_NEWLINE_AUTO_RETURN.0)
}

impl TermState {
    pub(crate) fn open(suppress_interrupts: bool) -> Result<Self> {
        unsafe {
            let input =
                GetStdHandle(STD_INPUT_HANDLE).map_err(|_| TermError::HandleResolution)?;
            let output =
                GetStdHandle(STD_OUTPUT_HANDLE).map_err(|_| TermError::HandleResolution)?;
            if input.is_invalid() || output.is_invalid() {
                return Err(TermError::HandleResolution);
            }

            let mut original_input_mode = CONSOLE_MODE(0);
            GetConsoleMode(input, &mut original_input_mode)
                .map_err(|e| TermError::ConfigRead(os_error(e)))?;
            let mut original_output_mode = CONSOLE_MODE(0);
            GetConsoleMode(output, &mut original_output_mode)
                .map_err(|e| TermError::ConfigRead(os_error(e)))?;

            SetConsoleMode(output, raw_output_mode(original_output_mode))
                .map_err(|e| TermError::ConfigWrite(os_error(e)))?;
            if let Err(e) =
                SetConsoleMode(input, raw_input_mode(original_input_mode, suppress_interrupts))
            {
                // A half-applied open must not leave the console modified.
                let _ = SetConsoleMode(output, original_output_mode);
                return Err(TermError::ConfigWrite(os_error(e)));
            }

            Ok(Self {
                input,
                output,
                original_input_mode,
                original_output_mode,
            })
        }
    }

    pub(crate) fn restore(&self) -> Result<()> {
        unsafe {
            SetConsoleMode(self.output, self.original_output_mode)
                .map_err(|e| TermError::Restore(os_error(e)))?;
            SetConsoleMode(self.input, self.original_input_mode)
                .map_err(|e| TermError::Restore(os_error(e)))?;
        }
        Ok(())
    }

    pub(crate) fn read_byte(&self) -> Result<Option<u8>> {
        unsafe {
            let mut pending: u32 = 0;
            GetNumberOfConsoleInputEvents(self.input, &mut pending)
                .map_err(|e| TermError::ReadIo(os_error(e)))?;
            if pending == 0 {
                return Ok(None);
            }

            let mut records = [INPUT_RECORD::default(); 32];
            let mut fetched: u32 = 0;
            PeekConsoleInputW(self.input, &mut records, &mut fetched)
                .map_err(|e| TermError::ReadIo(os_error(e)))?;

            let mut has_char = false;
            for record in &records[..fetched as usize] {
                if u32::from(record.EventType) != KEY_EVENT as u32 {
                    continue;
                }
                let key = record.Event.KeyEvent;
                if key.bKeyDown.as_bool() && key.uChar.UnicodeChar != 0 {
                    has_char = true;
                    break;
                }
            }
            if !has_char {
                // Drain window/mouse/key-up records so they do not keep the
                // queue reporting pending input forever.
                let mut drained: u32 = 0;
                ReadConsoleInputW(self.input, &mut records, &mut drained)
                    .map_err(|e| TermError::ReadIo(os_error(e)))?;
                return Ok(None);
            }

            // A character event is queued, so this read completes without
            // waiting.
            let mut buf = [0u8; 1];
            let mut nread: u32 = 0;
            ReadFile(self.input, Some(&mut buf), Some(&mut nread), None)
                .map_err(|e| TermError::ReadIo(os_error(e)))?;
            if nread != 1 {
                return Err(TermError::ReadIo(io::Error::new(
                    io::ErrorKind::Other,
                    "console reported pending input but returned no bytes",
                )));
            }
            Ok(Some(buf[0]))
        }
    }

    pub(crate) fn window_size(&self) -> Result<TermSize> {
        let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe {
            GetConsoleScreenBufferInfo(self.output, &mut info)
                .map_err(|e| TermError::SizeQuery(os_error(e)))?;
        }
        let cols = (info.srWindow.Right - info.srWindow.Left + 1).max(0) as u16;
        let rows = (info.srWindow.Bottom - info.srWindow.Top + 1).max(0) as u16;
        if cols == 0 {
            return Err(TermError::ZeroColumns);
        }
        Ok(TermSize { rows, cols })
    }
}
