// Consistent exit codes for the folio CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error (bad tree, bad patch, unreadable JSON)
//   3  = block or input file not found
//   4  = storage error

use folio_engine::{BlockError, StoreError};

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    Storage = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(block_err) = cause.downcast_ref::<BlockError>() {
                return Self::from_block_error(block_err);
            }
            if cause.downcast_ref::<StoreError>().is_some() {
                return Self::Storage;
            }
            if cause.downcast_ref::<serde_json::Error>().is_some() {
                return Self::Usage;
            }
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                return match io_err.kind() {
                    std::io::ErrorKind::NotFound => Self::NotFound,
                    _ => Self::Error,
                };
            }
        }
        Self::Error
    }

    pub fn from_block_error(err: &BlockError) -> Self {
        match err {
            BlockError::NotFound(_) => Self::NotFound,
            BlockError::Validation(_) => Self::Usage,
            BlockError::Persistence(_) => Self::Storage,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}
