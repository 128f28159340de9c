// Consistent exit codes for the linktitles CLI.
//
//   0 = success
//   1 = general error
//   2 = usage/argument error
//   3 = page not found
//   4 = configuration error

use std::process;

use linktitles_core::{ConfigError, LinkError, ProviderError, TitleError};

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    Config = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Config;
            }
            if cause.downcast_ref::<TitleError>().is_some()
                || cause.downcast_ref::<UsageError>().is_some()
            {
                return Self::Usage;
            }
            if let Some(ProviderError::NotFound(_)) = cause.downcast_ref::<ProviderError>() {
                return Self::NotFound;
            }
            // `LinkError` forwards `source()` of the wrapped error, so the
            // wrapped value itself never shows up in the chain.
            match cause.downcast_ref::<LinkError>() {
                Some(LinkError::Provider(ProviderError::NotFound(_))) => return Self::NotFound,
                Some(LinkError::Title(_)) => return Self::Usage,
                _ => {}
            }
        }

        Self::Error
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

/// Invalid combination of arguments that clap cannot express.
#[derive(Debug)]
pub struct UsageError(pub String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "usage error: {}", self.0)
    }
}

impl std::error::Error for UsageError {}
