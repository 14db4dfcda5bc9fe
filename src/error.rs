// error.rs - Error type shared by the engine, scheduler and exporters

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, IsingError>;

#[derive(Error, Debug)]
pub enum IsingError {
    /// A parameter was rejected before any simulation work began.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Inverse-CDF sampling ran past the last bin. Only a broken
    /// normalisation can cause this.
    #[error("degree sampling exhausted: draw {draw} never exceeded cumulative mass {total}")]
    SamplingExhausted { draw: f64, total: f64 },

    /// A scan result slot was written by more than one task.
    #[error("result slot {index} written twice")]
    SlotAlreadyWritten { index: usize },

    #[error("result slot {index} never written")]
    SlotEmpty { index: usize },

    #[error("worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl IsingError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }
}
