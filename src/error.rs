use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FreezeOutError>;

#[derive(Debug, Error)]
pub enum FreezeOutError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid proper time {tau} for the surface element of cell ({ix}, {iy}, {ieta})")]
    InvalidProperTime {
        tau: f64,
        ix: usize,
        iy: usize,
        ieta: usize,
    },

    #[error("negative temperature {temperature} for the surface element of cell ({ix}, {iy}, {ieta})")]
    NegativeTemperature {
        temperature: f64,
        ix: usize,
        iy: usize,
        ieta: usize,
    },

    #[error("equation of state: {0}")]
    Eos(String),

    #[error("boundary exchange failed on rank {rank}: {reason}")]
    Exchange { rank: usize, reason: String },

    #[error("no root found starting from {start}")]
    RootNotFound { start: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
