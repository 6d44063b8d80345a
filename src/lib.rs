//! RGB-D convolutional classifier
//!
//! Trains a small LeNet-style network on the RGB-D_10 dataset (32x32 images,
//! 10 classes, RGB or RGB-D input) with candle, and reports training,
//! validation and test error.
//!
//! # Architecture
//!
//! - **Data**: `.npy` backed dataset splits, synthetic self-test data, and the
//!   fixed-size batch windowing used for training and evaluation
//! - **Model**: two SAME-padded 6x6 convolutions with 2x2 max pooling,
//!   followed by two fully connected layers
//! - **Training**: an engine trait wrapping forward/backward/Adam, and a
//!   trainer that runs a fixed number of steps with periodic evaluation
//!
//! # Example
//!
//! ```ignore
//! use rgbd_convnet::{NetConfig, data::fake_data};
//! use rgbd_convnet::training::{CandleEngine, Trainer, TrainingConfig};
//!
//! let training = TrainingConfig::default();
//! let mut engine = CandleEngine::new(NetConfig::default(), &training, Device::Cpu)?;
//! let report = Trainer::new(training).run(&mut engine, &datasets)?;
//! println!("Test error: {}", report.test_error);
//! ```

pub mod config;
pub mod data;
pub mod layers;
pub mod models;
pub mod training;
pub mod utils;

// Re-export commonly used items
pub use config::NetConfig;
pub use models::RgbdNet;

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum ConvNetError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NumPy read error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),
}

pub type Result<T> = std::result::Result<T, ConvNetError>;
