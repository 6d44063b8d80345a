/// Training infrastructure for the RGB-D classifier
pub mod engine;
pub mod history;
pub mod trainer;

pub use engine::CandleEngine;
pub use history::History;
pub use trainer::{RunReport, Trainer, TrainingConfig};

use crate::data::Batch;

/// Owner of the network parameters: forward computation, loss and updates
///
/// The trainer only decides which samples go where; everything numerical
/// happens behind this trait.
pub trait TrainingEngine {
    /// (Re)initialise every parameter and any optimizer state
    fn initialize(&mut self) -> crate::Result<()>;

    /// Apply one gradient update on `batch`, returning the batch loss
    fn train_step(&mut self, batch: &Batch<'_>) -> crate::Result<f32>;

    /// Fraction of `batch` the current parameters misclassify
    fn evaluate(&self, batch: &Batch<'_>) -> crate::Result<f32>;
}
