use std::path::PathBuf;
use thiserror::Error;

/// Conditions that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no shop sections found in catalog document; raw response saved to {dump_path:?}")]
    SectionsNotFound { dump_path: PathBuf },
    #[error("no shop sections found in {path:?}")]
    NoSectionsInFile { path: PathBuf },
    #[error("catalog source '{source_name}' returned an unusable document: {reason}")]
    InvalidDocument { source_name: String, reason: String },
}
