/// candle-backed training engine
use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

use super::{TrainingConfig, TrainingEngine};
use crate::data::Batch;
use crate::layers::conv::{BIAS_INIT, WEIGHT_STD};
use crate::utils::{count_parameters, trunc_normal};
use crate::{NetConfig, RgbdNet};

/// Trains an [`RgbdNet`] with Adam on softmax cross-entropy
pub struct CandleEngine {
    model: RgbdNet,
    varmap: VarMap,
    optimizer: AdamW,
    optimizer_params: ParamsAdamW,
    device: Device,
    seed: u64,
}

impl CandleEngine {
    /// Create new engine
    ///
    /// Parameters are allocated here but only receive their seeded values in
    /// [`TrainingEngine::initialize`].
    pub fn new(
        net_config: NetConfig,
        training_config: &TrainingConfig,
        device: Device,
    ) -> crate::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = RgbdNet::new(net_config, vb)?;

        // Adam is AdamW without decay
        let optimizer_params = ParamsAdamW {
            lr: training_config.learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
        };
        let optimizer = AdamW::new(varmap.all_vars(), optimizer_params.clone())?;

        let num_params: usize = varmap
            .all_vars()
            .iter()
            .map(|v| count_parameters(v.as_tensor()))
            .sum();
        log::info!(
            "Model created: {} parameters, {} input channels, device {:?}",
            num_params,
            model.config().num_channels,
            device
        );

        Ok(Self {
            model,
            varmap,
            optimizer,
            optimizer_params,
            device,
            seed: training_config.seed,
        })
    }

    /// Named parameters sorted by name, so initialisation order is stable
    fn sorted_vars(&self) -> crate::Result<Vec<(String, Var)>> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|e| crate::ConvNetError::Training(format!("Parameter map poisoned: {}", e)))?;

        let mut vars: Vec<(String, Var)> = data
            .iter()
            .map(|(name, var)| (name.clone(), var.clone()))
            .collect();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(vars)
    }

    pub fn model(&self) -> &RgbdNet {
        &self.model
    }

    /// Save all parameters to a safetensors file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        log::info!("Saving model to {}", path.as_ref().display());
        self.varmap.save(path)?;
        Ok(())
    }

    /// Replace all parameters with the ones stored in a safetensors file
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> crate::Result<()> {
        self.varmap.load(path)?;
        Ok(())
    }

    fn logits(&self, batch: &Batch<'_>) -> candle_core::Result<(Tensor, Tensor)> {
        let (images, labels) = batch.to_tensors(&self.device)?;
        let logits = self.model.forward(&images)?;
        Ok((logits, labels))
    }
}

impl TrainingEngine for CandleEngine {
    fn initialize(&mut self) -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        for (name, var) in self.sorted_vars()? {
            let values = if name.ends_with("weight") {
                trunc_normal(var.elem_count(), WEIGHT_STD as f32, &mut rng)
            } else {
                vec![BIAS_INIT as f32; var.elem_count()]
            };

            let tensor = Tensor::from_vec(values, var.dims().to_vec(), &self.device)?
                .to_dtype(var.dtype())?;
            var.set(&tensor)?;
        }

        // Fresh moment estimates for the fresh parameters
        self.optimizer = AdamW::new(self.varmap.all_vars(), self.optimizer_params.clone())?;

        log::debug!("Parameters initialised with seed {}", self.seed);
        Ok(())
    }

    fn train_step(&mut self, batch: &Batch<'_>) -> crate::Result<f32> {
        let (logits, labels) = self.logits(batch)?;
        let loss = loss::cross_entropy(&logits, &labels)?;

        // Backward pass + parameter update
        self.optimizer.backward_step(&loss)?;

        let loss_val = loss.to_scalar::<f32>()?;
        log::debug!("Train step: batch={}, loss={:.4}", batch.len(), loss_val);
        Ok(loss_val)
    }

    fn evaluate(&self, batch: &Batch<'_>) -> crate::Result<f32> {
        let (logits, labels) = self.logits(batch)?;

        let predictions = logits.argmax(D::Minus1)?;
        let accuracy = predictions
            .eq(&labels)?
            .to_dtype(DType::F32)?
            .mean_all()?
            .to_scalar::<f32>()?;

        Ok(1.0 - accuracy)
    }
}
