/// Training loop for the RGB-D classifier
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::history::History;
use super::TrainingEngine;
use crate::data::{eval_batches, BatchCursor, DataSets, Split};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Samples per training step
    pub batch_size: usize,
    /// Samples per evaluation chunk
    pub eval_batch_size: usize,
    /// Passes over the training split
    pub num_epochs: usize,
    /// Steps between evaluations
    pub eval_frequency: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Seed for parameter initialisation
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            eval_batch_size: 1024,
            num_epochs: 30,
            eval_frequency: 100,
            learning_rate: 1e-4,
            seed: 66478,
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.batch_size == 0 || self.eval_batch_size == 0 {
            return Err(crate::ConvNetError::Config(
                "batch_size and eval_batch_size must be > 0".to_string(),
            ));
        }

        if self.eval_frequency == 0 {
            return Err(crate::ConvNetError::Config(
                "eval_frequency must be > 0".to_string(),
            ));
        }

        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(crate::ConvNetError::Config(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }

    /// Number of steps needed for `num_epochs` passes over `train_size` samples
    pub fn total_steps(&self, train_size: usize) -> usize {
        (self.num_epochs * train_size) / self.batch_size
    }
}

/// Outcome of a full training run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub history: History,
    pub test_error: f32,
    pub steps: usize,
}

/// Drives a [`TrainingEngine`] through a fixed number of steps
pub struct Trainer {
    config: TrainingConfig,
    output_dir: Option<PathBuf>,
    run_tag: String,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            output_dir: None,
            run_tag: "D".to_string(),
        }
    }

    /// Write the error history into `dir` as `<series>_<tag>.json` after training
    pub fn with_output<P: Into<PathBuf>>(mut self, dir: P, tag: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self.run_tag = tag.into();
        self
    }

    /// Mean error of `engine` over `split` in `eval_batch_size` chunks
    pub fn eval_split<E: TrainingEngine>(&self, engine: &E, split: &Split) -> crate::Result<f32> {
        eval_batches(split, self.config.eval_batch_size, |batch| {
            engine.evaluate(&batch)
        })
    }

    /// Full training loop
    ///
    /// Initialises the engine, trains for `num_epochs * train_size /
    /// batch_size` steps, evaluating every `eval_frequency` steps, saves the
    /// history and returns it together with the test error.
    pub fn run<E: TrainingEngine>(&self, engine: &mut E, data: &DataSets) -> crate::Result<RunReport> {
        self.config.validate()?;

        // Fail on impossible batch sizes before any work is done
        let mut cursor = BatchCursor::new(data.train.len(), self.config.batch_size)?;
        for (name, split) in [("validation", &data.validation), ("test", &data.test)] {
            if self.config.eval_batch_size > split.len() {
                return Err(crate::ConvNetError::Config(format!(
                    "eval_batch_size {} exceeds {} split size {}",
                    self.config.eval_batch_size,
                    name,
                    split.len()
                )));
            }
        }

        engine.initialize()?;

        let total_steps = self.config.total_steps(data.train.len());
        log::info!(
            "Starting training: {} epochs, {} steps, batch size {}",
            self.config.num_epochs,
            total_steps,
            self.config.batch_size
        );

        let mut history = History::new();

        for step in 0..total_steps {
            let batch = data.train.batch(cursor.next_window());
            let loss = engine.train_step(&batch)?;

            if step % self.config.eval_frequency == 0 {
                let train_error = engine.evaluate(&batch)?;
                let validation_error = self.eval_split(engine, &data.validation)?;
                history.record(
                    train_error,
                    step / self.config.eval_frequency,
                    validation_error,
                );

                log::info!(
                    "Step {}/{}: loss={:.4}, train error={:.4}, validation error={:.4}",
                    step,
                    total_steps,
                    loss,
                    train_error,
                    validation_error
                );
            }
        }

        log::info!("Training complete!");

        if let Some(dir) = &self.output_dir {
            history.save(dir, &self.run_tag)?;
        }

        let test_error = self.eval_split(engine, &data.test)?;
        log::info!("Test error: {:.4}", test_error);

        Ok(RunReport {
            history,
            test_error,
            steps: total_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fake_data, Batch};
    use std::ops::Range;

    /// Records what the trainer asks of it; error = mean label of the batch
    #[derive(Default)]
    struct RecordingEngine {
        initialized: usize,
        train_windows: Vec<Range<u32>>,
        evaluations: std::cell::Cell<usize>,
    }

    impl TrainingEngine for RecordingEngine {
        fn initialize(&mut self) -> crate::Result<()> {
            self.initialized += 1;
            Ok(())
        }

        fn train_step(&mut self, batch: &Batch<'_>) -> crate::Result<f32> {
            let first = batch.labels[0];
            let last = batch.labels[batch.len() - 1];
            self.train_windows.push(first..last + 1);
            Ok(0.0)
        }

        fn evaluate(&self, batch: &Batch<'_>) -> crate::Result<f32> {
            self.evaluations.set(self.evaluations.get() + 1);
            let sum: u32 = batch.labels.iter().sum();
            Ok(sum as f32 / batch.len() as f32)
        }
    }

    /// Split whose labels are the sample indices, so windows can be read back
    fn indexed_split(n: usize) -> Split {
        let images = ndarray::Array4::<f32>::zeros((n, 1, 1, 1));
        let labels = ndarray::Array1::from_iter((0..n).map(|i| i as u32));
        Split::new(images, labels).unwrap()
    }

    fn config(
        batch_size: usize,
        eval_batch_size: usize,
        num_epochs: usize,
        eval_frequency: usize,
    ) -> TrainingConfig {
        TrainingConfig {
            batch_size,
            eval_batch_size,
            num_epochs,
            eval_frequency,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_matches_reference_constants() {
        let config = TrainingConfig::default();
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.eval_batch_size, 1024);
        assert_eq!(config.num_epochs, 30);
        assert_eq!(config.eval_frequency, 100);
        assert_eq!(config.seed, 66478);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.json");
        std::fs::write(&path, r#"{ "num_epochs": 2, "learning_rate": 0.001 }"#).unwrap();

        let config = TrainingConfig::from_json_file(&path).unwrap();
        assert_eq!(config.num_epochs, 2);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_config_rejects_zero_eval_frequency() {
        assert!(config(64, 1024, 1, 0).validate().is_err());
    }

    #[test]
    fn test_total_steps() {
        assert_eq!(TrainingConfig::default().total_steps(256), 120);
        assert_eq!(config(64, 1024, 1, 100).total_steps(256), 4);
        assert_eq!(config(64, 1024, 3, 100).total_steps(100), 4);
    }

    #[test]
    fn test_run_walks_training_windows() {
        let data = DataSets::new(indexed_split(256), indexed_split(20), indexed_split(20)).unwrap();
        let trainer = Trainer::new(config(64, 8, 2, 100));
        let mut engine = RecordingEngine::default();

        let report = trainer.run(&mut engine, &data).unwrap();

        assert_eq!(engine.initialized, 1);
        assert_eq!(report.steps, 8);
        assert_eq!(
            engine.train_windows,
            vec![0..64, 64..128, 128..192, 192..256, 0..64, 64..128, 128..192, 192..256]
        );
    }

    #[test]
    fn test_run_evaluates_on_schedule() {
        let data = DataSets::new(indexed_split(100), indexed_split(10), indexed_split(10)).unwrap();
        // 10 epochs of 100 samples in batches of 10: 100 steps, evaluate at 0, 30, 60, 90
        let trainer = Trainer::new(config(10, 4, 10, 30));
        let mut engine = RecordingEngine::default();

        let report = trainer.run(&mut engine, &data).unwrap();

        assert_eq!(report.history.len(), 4);
        assert_eq!(report.history.plot_step, vec![0, 1, 2, 3]);
        assert_eq!(report.history.train_error.len(), 4);
        assert_eq!(report.history.validation_error.len(), 4);

        // Per evaluation: 1 training batch + 3 validation chunks; then 3 test chunks
        assert_eq!(engine.evaluations.get(), 4 * 4 + 3);
    }

    #[test]
    fn test_run_reports_chunked_means() {
        let data = DataSets::new(indexed_split(64), indexed_split(10), indexed_split(10)).unwrap();
        let trainer = Trainer::new(config(64, 4, 1, 100));
        let mut engine = RecordingEngine::default();

        let report = trainer.run(&mut engine, &data).unwrap();

        // Training batch [0, 64): mean label 31.5
        assert_eq!(report.history.train_error, vec![31.5]);
        // Chunks [0,4) [4,8) [6,10): means 1.5, 5.5, 7.5
        let expected = (1.5 + 5.5 + 7.5) / 3.0;
        assert!((report.history.validation_error[0] - expected).abs() < 1e-6);
        assert!((report.test_error - expected).abs() < 1e-6);
    }

    #[test]
    fn test_run_saves_history() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataSets::new(fake_data(256, 1, 4), fake_data(64, 1, 4), fake_data(64, 1, 4)).unwrap();
        let trainer = Trainer::new(config(64, 64, 1, 2)).with_output(dir.path(), "self_test");
        let mut engine = RecordingEngine::default();

        let report = trainer.run(&mut engine, &data).unwrap();

        assert_eq!(report.history.plot_step, vec![0, 1]);
        assert_eq!(History::load(dir.path(), "self_test").unwrap(), report.history);
    }

    #[test]
    fn test_run_rejects_oversized_batches() {
        let data = DataSets::new(indexed_split(32), indexed_split(16), indexed_split(16)).unwrap();
        let mut engine = RecordingEngine::default();

        let too_big_train = Trainer::new(config(64, 8, 1, 100));
        assert!(matches!(
            too_big_train.run(&mut engine, &data),
            Err(crate::ConvNetError::Config(_))
        ));

        let too_big_eval = Trainer::new(config(8, 1024, 1, 100));
        assert!(matches!(
            too_big_eval.run(&mut engine, &data),
            Err(crate::ConvNetError::Config(_))
        ));

        assert_eq!(engine.initialized, 0);
    }
}
