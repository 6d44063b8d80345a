/// LeNet-style classifier for RGB-D images
use candle_core::{Result, Tensor};
use candle_nn::VarBuilder;

use crate::config::NetConfig;
use crate::layers::{max_pool_2x2, Dense, SameConv2d};

pub mod loader;

/// Convolutional classifier
///
/// ```text
/// [B, H, W, C]
///   -> conv 6x6 (C -> 32), relu, max pool 2x2
///   -> conv 6x6 (32 -> 64), relu, max pool 2x2
///   -> flatten [B, H/4 * W/4 * 64]
///   -> dense 1024, relu
///   -> dense num_labels (logits)
/// ```
///
/// The layers own their parameter tensors; `forward` is pure.
pub struct RgbdNet {
    config: NetConfig,
    conv1: SameConv2d,
    conv2: SameConv2d,
    fc1: Dense,
    fc2: Dense,
}

impl RgbdNet {
    /// Create new network, registering its parameters in `vb`
    pub fn new(config: NetConfig, vb: VarBuilder) -> crate::Result<Self> {
        config.validate()?;

        let conv1 = SameConv2d::new(
            config.num_channels,
            config.conv1_features,
            config.kernel_size,
            vb.pp("conv1"),
        )?;
        let conv2 = SameConv2d::new(
            config.conv1_features,
            config.conv2_features,
            config.kernel_size,
            vb.pp("conv2"),
        )?;
        let fc1 = Dense::new(config.flat_features(), config.hidden_size, vb.pp("fc1"))?;
        let fc2 = Dense::new(config.hidden_size, config.num_labels, vb.pp("fc2"))?;

        Ok(Self {
            config,
            conv1,
            conv2,
            fc1,
            fc2,
        })
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `images` - Input batch `[batch, height, width, channels]`
    ///
    /// # Returns
    /// Unnormalised class scores `[batch, num_labels]`
    pub fn forward(&self, images: &Tensor) -> Result<Tensor> {
        // NHWC -> NCHW for the convolutions
        let xs = images.permute((0, 3, 1, 2))?.contiguous()?;

        let xs = max_pool_2x2(&self.conv1.forward(&xs)?.relu()?)?;
        let xs = max_pool_2x2(&self.conv2.forward(&xs)?.relu()?)?;

        // Flatten in (h, w, c) order
        let xs = xs.permute((0, 2, 3, 1))?.contiguous()?.flatten_from(1)?;

        let xs = self.fc1.forward(&xs)?.relu()?;
        self.fc2.forward(&xs)
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }
}
