/// Train the RGB-D_10 convolutional classifier and report its test error
use std::path::PathBuf;

use anyhow::Context;
use candle_core::Device;
use clap::Parser;
use rgbd_convnet::data::{fake_data, read_data_sets, DataSets, DatasetMetadata};
use rgbd_convnet::training::{CandleEngine, Trainer, TrainingConfig};

/// Self-test mode trains on this many synthetic images
const SELF_TEST_TRAIN_IMAGES: usize = 256;

#[derive(Debug, Parser)]
#[command(name = "rgbd-convnet", about = "LeNet-style classifier for the RGB-D_10 dataset")]
struct Cli {
    /// Use RGB-D input (4 channels); `--use_rgbd=false` selects RGB (3 channels)
    #[arg(
        long = "use_rgbd",
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    use_rgbd: bool,

    /// Run a quick self test on synthetic data
    #[arg(long = "self_test", action = clap::ArgAction::SetTrue)]
    self_test: bool,

    /// Directory holding the dataset .npy files
    #[arg(long = "data-dir", value_name = "PATH", default_value = "data/rgbd")]
    data_dir: PathBuf,

    /// Directory the error history (and model) is written to
    #[arg(long = "output-dir", value_name = "PATH", default_value = ".")]
    output_dir: PathBuf,

    /// JSON file overriding the training configuration
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the number of training epochs
    #[arg(long = "epochs", value_name = "N")]
    epochs: Option<usize>,

    /// Save the trained weights as safetensors
    #[arg(long = "save-model", action = clap::ArgAction::SetTrue)]
    save_model: bool,

    /// Force the CPU even when CUDA is available
    #[arg(long = "cpu", action = clap::ArgAction::SetTrue)]
    cpu: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let device = if !cli.cpu && candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)?
    } else {
        Device::Cpu
    };
    log::info!("Using device: {:?}", device);

    let mut training_config = match &cli.config {
        Some(path) => TrainingConfig::from_json_file(path)
            .with_context(|| format!("Failed to load training config {}", path.display()))?,
        None => TrainingConfig::default(),
    };
    if let Some(epochs) = cli.epochs {
        training_config.num_epochs = epochs;
    }

    let image_size = DatasetMetadata::default().image_size;
    let (data, tag) = if cli.self_test {
        println!("Running self-test.");
        training_config.num_epochs = 1;

        let eval_images = training_config.eval_batch_size;
        let data = DataSets::new(
            fake_data(SELF_TEST_TRAIN_IMAGES, 1, image_size),
            fake_data(eval_images, 1, image_size),
            fake_data(eval_images, 1, image_size),
        )?;
        (data, "self_test")
    } else {
        print_banner(cli.use_rgbd);
        let data = read_data_sets(&cli.data_dir, cli.use_rgbd).with_context(|| {
            format!(
                "Failed to load RGB-D dataset from {}\nHint: expected <split>_images.npy and \
<split>_labels.npy for the train, validation and test splits",
                cli.data_dir.display()
            )
        })?;
        (data, if cli.use_rgbd { "D" } else { "RGB" })
    };

    let net_config = data.net_config()?;
    log::info!("Model configuration: {:#?}", net_config);
    log::info!("Training configuration: {:#?}", training_config);

    let mut engine = CandleEngine::new(net_config, &training_config, device)?;
    let trainer = Trainer::new(training_config).with_output(&cli.output_dir, tag);

    let report = trainer.run(&mut engine, &data)?;

    if cli.save_model {
        engine.save(cli.output_dir.join(format!("{}_model.safetensors", tag)))?;
    }

    log::info!(
        "Finished {} steps with {} evaluations",
        report.steps,
        report.history.len()
    );
    println!("Test error: {}", report.test_error);

    Ok(())
}

fn print_banner(use_rgbd: bool) {
    let (input, channels) = if use_rgbd { ("RGB-D", 4) } else { ("RGB", 3) };
    println!("****** RGBD_10 dataset ******");
    println!("* Input: {:<19}*", input);
    println!("* Channels: {:<16}*", channels);
    println!("*****************************");
}
