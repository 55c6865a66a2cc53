//! Pseudo-terminal processes for the transport programs
//!
//! `ssh` and `scp` only prompt for passwords on a terminal, so both run
//! inside a portable-pty pair. A reader thread forwards output over a
//! channel; writes go straight to the master.

use crate::error::{Error, Result};
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

/// One event from the reader thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtyOutput {
    Data(Vec<u8>),
    Closed,
}

/// Writer half shared between a channel and its delivery thread
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// A program running on a pseudo-terminal
pub struct PtyProcess {
    program: String,
    // Keeps the master side open for the lifetime of the child
    _master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: SharedWriter,
}

impl PtyProcess {
    /// Spawn `program` with `args` on a new pseudo-terminal
    pub fn spawn(program: &str, args: &[String], size: PtySize) -> Result<(Self, Receiver<PtyOutput>)> {
        let pair = native_pty_system()
            .openpty(size)
            .map_err(|e| Error::PtyCreationFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let mut cmd_builder = CommandBuilder::new(program);
        cmd_builder.args(args);

        let child = pair
            .slave
            .spawn_command(cmd_builder)
            .map_err(|e| Error::TransportSpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;
        // The child holds its own copy of the slave side
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::PtyCreationFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::PtyCreationFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let (tx, rx) = channel::<PtyOutput>();
        let name = program.to_string();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(PtyOutput::Data(buf[..n].to_vec())).is_err() {
                            debug!("{} output receiver dropped", name);
                            return;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        // EIO once the child has exited on Linux
                        debug!("{} read ended: {}", name, e);
                        break;
                    }
                }
            }
            let _ = tx.send(PtyOutput::Closed);
            debug!("{} reader thread exiting", name);
        });

        debug!("Spawned {} on a pseudo-terminal", program);
        Ok((
            Self {
                program: program.to_string(),
                _master: pair.master,
                child,
                writer: Arc::new(Mutex::new(writer)),
            },
            rx,
        ))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shared handle to the writer
    pub fn writer(&self) -> SharedWriter {
        Arc::clone(&self.writer)
    }

    /// Write bytes to the program's terminal
    pub fn write(&self, data: &[u8]) -> Result<()> {
        write_shared(&self.writer, data)
    }

    /// Wait for the program to exit; true on success
    pub fn wait(&mut self) -> Result<bool> {
        let status = self.child.wait()?;
        Ok(status.success())
    }

    /// Stop the program if it is still running
    pub fn kill(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                debug!("Failed to kill {}: {}", self.program, e);
            }
            let _ = self.child.wait();
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Write and flush through a shared writer
pub fn write_shared(writer: &SharedWriter, data: &[u8]) -> Result<()> {
    let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
    writer
        .write_all(data)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::StreamWriteFailed {
            reason: e.to_string(),
        })
}

/// Terminal size for transport programs
pub fn pty_size(rows: u16, cols: usize) -> PtySize {
    PtySize {
        rows,
        cols: u16::try_from(cols).unwrap_or(u16::MAX),
        pixel_width: 0,
        pixel_height: 0,
    }
}
