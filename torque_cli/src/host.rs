//! Host command transport: one command per stdin line.
//!
//! The reader thread only parses and forwards; all state changes happen on
//! the control loop. EOF drops the sender, which the runner sees as a hangup.
use std::io::BufRead;
use std::thread;

use crossbeam_channel::Sender;
use torque_core::Command;

pub fn spawn_reader<R>(input: R, tx: Sender<Command>) -> std::io::Result<thread::JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("host-reader".into())
        .spawn(move || forward_lines(input, &tx))
}

/// Parse lines until EOF, a read error, or until the control loop goes away.
///
/// Lines are decoded lossily so line noise is rejected like any other
/// malformed command instead of ending the reader.
pub fn forward_lines<R: BufRead>(mut input: R, tx: &Sender<Command>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "host input closed");
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<Command>() {
            Ok(cmd) => {
                tracing::debug!(command = %cmd, "host command");
                if tx.send(cmd).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!(line = %line, error = %e, "ignoring host line"),
        }
    }
}
