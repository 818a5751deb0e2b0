use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::time::Duration;

use super::prompt::UpPrompt;

#[derive(Debug, thiserror::Error)]
pub enum UpError {
    #[error("No confirmation within {0:?}")]
    Timeout(Duration),
    #[error("Confirmation aborted: {0}")]
    Aborted(String),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Evidence that the operator confirmed the challenge on the device.
#[derive(Debug)]
pub struct UserPresenceProof {
    pub(crate) _private: (),
}

/// Shows the challenge code to the operator and blocks until they report
/// having entered it on the key.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &UpPrompt, timeout: Duration) -> Result<UserPresenceProof, UpError>;
}

/// Prints the prompt to stderr and waits for a line of input.
///
/// A single reader thread per confirmer feeds lines into a channel. Lines
/// that arrive while no prompt is showing are discarded.
pub struct StdinConfirmer {
    lines: mpsc::Receiver<std::io::Result<usize>>,
}

impl StdinConfirmer {
    pub fn new() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    pub fn from_reader<R>(mut reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || loop {
            let mut line = String::new();
            let res = reader.read_line(&mut line);
            let done = !matches!(res, Ok(n) if n > 0);
            if tx.send(res).is_err() || done {
                break;
            }
        });
        Self { lines: rx }
    }
}

impl Default for StdinConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &UpPrompt, timeout: Duration) -> Result<UserPresenceProof, UpError> {
        // Input typed before this prompt does not count.
        while let Ok(Ok(n)) = self.lines.try_recv() {
            if n == 0 {
                return Err(UpError::Aborted("input closed".to_string()));
            }
        }

        let mut stderr = std::io::stderr();
        writeln!(stderr, "[{}] {}", prompt.title, prompt.description)?;
        stderr.flush()?;

        match self.lines.recv_timeout(timeout) {
            Ok(Ok(0)) => Err(UpError::Aborted("input closed".to_string())),
            Ok(Ok(_)) => Ok(UserPresenceProof { _private: () }),
            Ok(Err(e)) => Err(UpError::Io(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(UpError::Timeout(timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(UpError::Aborted("input reader exited".to_string()))
            }
        }
    }
}

/// Any closure can stand in for the operator (scripts, tests).
impl<F> Confirmer for F
where
    F: FnMut(&UpPrompt) -> Result<(), UpError>,
{
    fn confirm(&mut self, prompt: &UpPrompt, _timeout: Duration) -> Result<UserPresenceProof, UpError> {
        self(prompt)?;
        Ok(UserPresenceProof { _private: () })
    }
}
