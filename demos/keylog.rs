//! Prints the bytes the terminal delivers for each keypress.
//!
//! Interrupt suppression is on, so Ctrl-C shows up as 0x03 instead of killing
//! the process. Press q to quit.

use std::io::Write;
use std::time::Duration;

use rawtty::RawSession;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut session = RawSession::open(true)?;
    let size = session.size()?;

    // Raw mode: newline alone does not return the carriage.
    print!("terminal is {} rows x {} cols\r\n", size.rows, size.cols);
    print!("press keys to see their bytes, q to quit\r\n");
    std::io::stdout().flush()?;

    loop {
        match session.read_byte()? {
            Some(b'q') => break,
            Some(byte) => {
                print!("read byte 0x{byte:02X}\r\n");
                std::io::stdout().flush()?;
            }
            None => std::thread::sleep(Duration::from_millis(10)),
        }
    }

    session.close()?;
    Ok(())
}
