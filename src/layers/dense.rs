/// Fully connected layer
use candle_core::{Module, Result, Tensor};
use candle_nn::{Init, Linear, VarBuilder};

use super::conv::{BIAS_INIT, WEIGHT_STD};

/// Dense layer `y = x W^T + b` initialised like the convolutions
pub struct Dense {
    linear: Linear,
}

impl Dense {
    pub fn new(in_features: usize, out_features: usize, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(
            (out_features, in_features),
            "weight",
            Init::Randn {
                mean: 0.0,
                stdev: WEIGHT_STD,
            },
        )?;
        let bias = vb.get_with_hints(out_features, "bias", Init::Const(BIAS_INIT))?;

        Ok(Self {
            linear: Linear::new(weight, Some(bias)),
        })
    }

    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.linear.forward(xs)
    }
}
