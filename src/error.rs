use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Failed to launch '{}': {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The process ran but exited unsuccessfully, `output` is whatever it printed
    #[error("{output}")]
    ProcessFailed { code: Option<i32>, output: String },
    #[error("Unrecognized response from wine: {output:?}")]
    InvalidResponse { output: String },
}
