//! Logging setup and exit-code plumbing shared by both binaries.

use std::fmt;
use std::process::ExitCode;

/// Initialize stderr logging: `info` by default, `debug` when verbose.
/// `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// A failure that ends the process with a specific exit code.
pub struct Failure {
    pub code: u8,
    pub error: anyhow::Error,
}

impl Failure {
    pub fn new(code: u8, error: anyhow::Error) -> Self {
        Self { code, error }
    }

    /// Log the error chain and turn it into the process exit code.
    pub fn report(self) -> ExitCode {
        log::error!("{:#}", self.error);
        ExitCode::from(self.code)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit {}: {:#}", self.code, self.error)
    }
}

/// Attach an exit code to an error.
pub trait OrExit<T> {
    fn or_exit(self, code: u8) -> Result<T, Failure>;
}

impl<T, E> OrExit<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_exit(self, code: u8) -> Result<T, Failure> {
        self.map_err(|e| Failure::new(code, e.into()))
    }
}
