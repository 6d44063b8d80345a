/// Weight loading from safetensors files
use std::path::Path;
use candle_core::{Device, DType};
use candle_nn::VarBuilder;
use crate::NetConfig;
use super::RgbdNet;

/// Load a trained network from a safetensors file
///
/// # Arguments
/// * `config` - Topology the weights were trained with
/// * `weights_path` - Path to safetensors file
/// * `device` - Device to load model on
///
/// # Returns
/// Loaded RgbdNet
pub fn load_model<P: AsRef<Path>>(
    config: NetConfig,
    weights_path: P,
    device: &Device,
) -> crate::Result<RgbdNet> {
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path.as_ref()], DType::F32, device)?
    };

    RgbdNet::new(config, vb)
}
