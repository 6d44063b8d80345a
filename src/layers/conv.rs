/// Convolution and pooling with TensorFlow-style SAME padding
use candle_core::{Result, Tensor};
use candle_nn::{Init, VarBuilder};

/// Standard deviation of the weight initialisation used across the network
pub const WEIGHT_STD: f64 = 0.1;

/// Constant every bias starts at
pub const BIAS_INIT: f64 = 0.1;

/// Split the `kernel_size - 1` pixels of padding a stride-1 SAME convolution
/// needs into (before, after); the odd pixel goes after
pub fn same_padding(kernel_size: usize) -> (usize, usize) {
    let total = kernel_size.saturating_sub(1);
    let before = total / 2;
    (before, total - before)
}

/// Stride-1 2-D convolution whose output keeps the input's spatial size
///
/// Input and output are NCHW. Even kernel sizes pad asymmetrically, which is
/// why the padding is applied to the input here rather than through
/// `Conv2dConfig`.
pub struct SameConv2d {
    weight: Tensor, // [out, in, k, k]
    bias: Tensor,   // [out]
    kernel_size: usize,
}

impl SameConv2d {
    /// Create new convolution layer
    ///
    /// # Arguments
    /// * `in_channels` - Input feature maps
    /// * `out_channels` - Output feature maps
    /// * `kernel_size` - Edge length of the square kernel
    /// * `vb` - VarBuilder for parameter initialization
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let weight = vb.get_with_hints(
            (out_channels, in_channels, kernel_size, kernel_size),
            "weight",
            Init::Randn {
                mean: 0.0,
                stdev: WEIGHT_STD,
            },
        )?;
        let bias = vb.get_with_hints(out_channels, "bias", Init::Const(BIAS_INIT))?;

        Ok(Self {
            weight,
            bias,
            kernel_size,
        })
    }

    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (before, after) = same_padding(self.kernel_size);
        let padded = xs
            .pad_with_zeros(2, before, after)?
            .pad_with_zeros(3, before, after)?;

        let out = padded.conv2d(&self.weight, 0, 1, 1, 1)?;
        let out_channels = self.bias.dim(0)?;
        out.broadcast_add(&self.bias.reshape((1, out_channels, 1, 1))?)
    }
}

/// 2x2 max pooling with stride 2 over an NCHW tensor
pub fn max_pool_2x2(xs: &Tensor) -> Result<Tensor> {
    xs.max_pool2d(2)
}
