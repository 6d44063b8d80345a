/// Parameter initialisation helpers
use candle_core::Tensor;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Sample `count` values from N(0, std²), redrawing any sample that falls
/// more than two standard deviations from the mean
pub fn trunc_normal<R: Rng>(count: usize, std: f32, rng: &mut R) -> Vec<f32> {
    // negative or NaN std: nothing to sample from
    let Ok(normal) = Normal::new(0.0f32, std) else {
        return vec![0.0; count];
    };
    let bound = 2.0 * std;

    (0..count)
        .map(|_| loop {
            let value = normal.sample(rng);
            if value.abs() <= bound {
                break value;
            }
        })
        .collect()
}

/// Calculate the number of parameters in a tensor
pub fn count_parameters(tensor: &Tensor) -> usize {
    tensor.dims().iter().product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_trunc_normal_within_two_std() {
        let mut rng = StdRng::seed_from_u64(66478);
        let values = trunc_normal(10_000, 0.1, &mut rng);

        assert_eq!(values.len(), 10_000);
        assert!(values.iter().all(|v| v.abs() <= 0.2));

        let mean = values.iter().sum::<f32>() / values.len() as f32;
        assert!(mean.abs() < 0.01, "mean {} too far from 0", mean);
    }

    #[test]
    fn test_trunc_normal_is_seeded() {
        let a = trunc_normal(64, 0.1, &mut StdRng::seed_from_u64(7));
        let b = trunc_normal(64, 0.1, &mut StdRng::seed_from_u64(7));
        let c = trunc_normal(64, 0.1, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_count_parameters() -> candle_core::Result<()> {
        let t = Tensor::zeros((64, 32, 6, 6), DType::F32, &Device::Cpu)?;
        assert_eq!(count_parameters(&t), 64 * 32 * 36);
        Ok(())
    }
}
