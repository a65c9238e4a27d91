//! External formatter interface (spec §6, §4.7 step 5) and the cooperative
//! cancellation token threaded through the task driver (spec §5, "Context
//! threading").

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ApiLevelError, Result};

/// A cooperative cancellation signal. Cloning shares the same underlying
/// flag; only [`CancellationToken::cancel`] ever sets it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Reads schema source from stdin, writes formatted schema to stdout.
/// Non-empty stderr or a non-zero exit status is a failure (spec §6).
pub trait Formatter {
    fn format(&self, input: &[u8], cancel: &CancellationToken) -> Result<Vec<u8>>;
}

/// The "no formatter configured" default: returns the input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFormatter;

impl Formatter for IdentityFormatter {
    fn format(&self, input: &[u8], _cancel: &CancellationToken) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

/// Runs a configured external program as a child process, piping `input` to
/// its stdin and capturing its stdout, per spec §5 ("Resource handling").
///
/// The child is waited on synchronously; `cancel` is polled on a short
/// interval while waiting and, if set, the child is killed and
/// [`ApiLevelError::FormatterFailure`] is returned.
#[derive(Debug, Clone)]
pub struct ExternalProcessFormatter {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl ExternalProcessFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ExternalProcessFormatter {
            program: program.into(),
            args,
            poll_interval: Duration::from_millis(20),
        }
    }
}

impl Formatter for ExternalProcessFormatter {
    fn format(&self, input: &[u8], cancel: &CancellationToken) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ApiLevelError::FormatterFailure(format!("spawn failed: {e}")))?;

        // Stdin is written and stdout/stderr are read from their own threads
        // rather than sequentially on this one: a formatter that writes more
        // than a pipe buffer's worth of output before fully consuming stdin
        // would otherwise deadlock this thread blocked on `write_all` against
        // the child blocked on a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ApiLevelError::FormatterFailure("no stdin handle".into()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ApiLevelError::FormatterFailure("no stdout handle".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ApiLevelError::FormatterFailure("no stderr handle".into()))?;

        let input = input.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));
        let stdout_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).map(|_| buf)
        });

        loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                let _ = writer.join();
                let _ = stdout_reader.join();
                let _ = stderr_reader.join();
                return Err(ApiLevelError::FormatterFailure("cancelled".into()));
            }
            match child
                .try_wait()
                .map_err(|e| ApiLevelError::FormatterFailure(format!("wait failed: {e}")))?
            {
                Some(_) => break,
                None => std::thread::sleep(self.poll_interval),
            }
        }

        let status = child
            .wait()
            .map_err(|e| ApiLevelError::FormatterFailure(format!("wait failed: {e}")))?;

        writer
            .join()
            .map_err(|_| ApiLevelError::FormatterFailure("stdin writer thread panicked".into()))?
            .map_err(|e| ApiLevelError::FormatterFailure(format!("write to stdin: {e}")))?;
        let stdout = stdout_reader
            .join()
            .map_err(|_| ApiLevelError::FormatterFailure("stdout reader thread panicked".into()))?
            .map_err(|e| ApiLevelError::FormatterFailure(format!("read stdout: {e}")))?;
        let stderr = stderr_reader
            .join()
            .map_err(|_| ApiLevelError::FormatterFailure("stderr reader thread panicked".into()))?
            .map_err(|e| ApiLevelError::FormatterFailure(format!("read stderr: {e}")))?;

        if !status.success() {
            return Err(ApiLevelError::FormatterFailure(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                String::from_utf8_lossy(&stderr)
            )));
        }
        if !stderr.is_empty() {
            return Err(ApiLevelError::FormatterFailure(format!(
                "{} wrote to stderr: {}",
                self.program,
                String::from_utf8_lossy(&stderr)
            )));
        }

        Ok(stdout)
    }
}
