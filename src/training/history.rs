/// Error history recorded at every evaluation event
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Three aligned series, one entry per evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Error on the training batch of the evaluation step
    pub train_error: Vec<f32>,
    /// Evaluation step index (training step / evaluation frequency)
    pub plot_step: Vec<usize>,
    /// Mean error over the validation split
    pub validation_error: Vec<f32>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one evaluation event
    pub fn record(&mut self, train_error: f32, plot_step: usize, validation_error: f32) {
        self.train_error.push(train_error);
        self.plot_step.push(plot_step);
        self.validation_error.push(validation_error);
    }

    /// Number of evaluation events
    pub fn len(&self) -> usize {
        self.plot_step.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plot_step.is_empty()
    }

    /// Files the three series are written to, in (train, plot, validation) order
    pub fn paths(dir: &Path, tag: &str) -> [PathBuf; 3] {
        [
            dir.join(format!("train_{}.json", tag)),
            dir.join(format!("plot_{}.json", tag)),
            dir.join(format!("validation_{}.json", tag)),
        ]
    }

    /// Write each series as a JSON array into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P, tag: &str) -> crate::Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let [train_path, plot_path, validation_path] = Self::paths(dir, tag);
        write_json(&train_path, &self.train_error)?;
        write_json(&plot_path, &self.plot_step)?;
        write_json(&validation_path, &self.validation_error)?;

        log::info!(
            "Saved {} evaluation events to {}, {}, {}",
            self.len(),
            train_path.display(),
            plot_path.display(),
            validation_path.display()
        );
        Ok(())
    }

    /// Read back a history written by [`History::save`]
    pub fn load<P: AsRef<Path>>(dir: P, tag: &str) -> crate::Result<Self> {
        let [train_path, plot_path, validation_path] = Self::paths(dir.as_ref(), tag);

        let history = Self {
            train_error: serde_json::from_reader(BufReader::new(File::open(train_path)?))?,
            plot_step: serde_json::from_reader(BufReader::new(File::open(plot_path)?))?,
            validation_error: serde_json::from_reader(BufReader::new(File::open(
                validation_path,
            )?))?,
        };

        if history.train_error.len() != history.len()
            || history.validation_error.len() != history.len()
        {
            return Err(crate::ConvNetError::Data(format!(
                "History series are not aligned: train={}, plot={}, validation={}",
                history.train_error.len(),
                history.len(),
                history.validation_error.len()
            )));
        }

        Ok(history)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> crate::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
