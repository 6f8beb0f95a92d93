//! External line-protocol process transport.
//!
//! Each selector bound to a shell command owns one long-lived child process
//! for the whole run. A request writes one line to the child's stdin and
//! blocks for exactly one line on its stdout before the next request may be
//! sent. There is no timeout: a child that never answers stalls the stream.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::debug;
use thiserror::Error;

/// Errors from the external process transport.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("i/o with `{command}` failed: {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` produced no response line")]
    NoResponse { command: String },

    #[error("process was not started")]
    NotStarted,
}

/// A long-lived `/bin/sh -c` child speaking one line per request.
pub struct Process {
    command: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl Process {
    /// New transport for a shell command; nothing is spawned yet.
    pub fn new(command: impl Into<String>) -> Self {
        Process {
            command: command.into(),
            child: None,
            stdin: None,
            stdout: None,
        }
    }

    /// The shell command this transport runs.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Spawn the child with piped stdin/stdout.
    pub fn start(&mut self) -> Result<(), ProcessError> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        self.stdin = child.stdin.take();
        self.stdout = child.stdout.take().map(BufReader::new);
        self.child = Some(child);
        Ok(())
    }

    /// Send one request line and block for one response line.
    ///
    /// The terminating newline is appended on the way out and stripped from
    /// the response; an EOF before any line is `NoResponse`.
    pub fn round_trip(&mut self, line: &str) -> Result<String, ProcessError> {
        let command = self.command.clone();

        let stdin = self.stdin.as_mut().ok_or(ProcessError::NotStarted)?;
        debug!("request to `{command}`: {line}");
        stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .map_err(|source| ProcessError::Io {
                command: command.clone(),
                source,
            })?;

        let stdout = self.stdout.as_mut().ok_or(ProcessError::NotStarted)?;
        let mut reply = String::new();
        let read = stdout
            .read_line(&mut reply)
            .map_err(|source| ProcessError::Io {
                command: command.clone(),
                source,
            })?;
        if read == 0 {
            return Err(ProcessError::NoResponse { command });
        }
        if reply.ends_with('\n') {
            reply.pop();
            if reply.ends_with('\r') {
                reply.pop();
            }
        }
        debug!("response from `{command}`: {reply}");
        Ok(reply)
    }

    /// Close the child's stdin and reap it.
    pub fn stop(&mut self) -> Result<(), ProcessError> {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            child.wait().map_err(|source| ProcessError::Io {
                command: self.command.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}
