use thiserror::Error;
use tradeforge_data::DataError;
use tradeforge_execution::ExecutionError;

/// All top-level errors generated by a TradeForge replay run.
#[derive(Debug, Error)]
pub enum TradeForgeError {
    #[error("market data error: {0}")]
    Data(#[from] DataError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("checkpoint is corrupt: {reason}")]
    CheckpointCorrupt { reason: String },

    #[error("checkpoint version mismatch: expected {expected}, found {found}")]
    CheckpointVersionMismatch { expected: u32, found: u32 },

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TradeForgeError {
    /// Construct an [`TradeForgeError::Io`] with the offending path attached.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
