/// Network topology configuration
///
/// Image geometry, label count and layer widths of the LeNet-style network.
/// Passed to the model explicitly at construction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Height and width of the (square) input images
    pub image_size: usize,

    /// Input channels: 3 for RGB, 4 for RGB-D, 1 for self-test data
    pub num_channels: usize,

    /// Number of output classes
    pub num_labels: usize,

    /// Feature maps produced by the first convolution
    pub conv1_features: usize,

    /// Feature maps produced by the second convolution
    pub conv2_features: usize,

    /// Edge length of both convolution kernels
    pub kernel_size: usize,

    /// Width of the hidden fully connected layer
    pub hidden_size: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            image_size: 32,
            num_channels: 4,
            num_labels: 10,
            conv1_features: 32,
            conv2_features: 64,
            kernel_size: 6,
            hidden_size: 1024,
        }
    }
}

impl NetConfig {
    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.image_size == 0 || self.image_size % 4 != 0 {
            return Err(crate::ConvNetError::Config(format!(
                "image_size must be a positive multiple of 4, got {}",
                self.image_size
            )));
        }

        if self.num_channels == 0 {
            return Err(crate::ConvNetError::Config(
                "num_channels must be > 0".to_string(),
            ));
        }

        if self.num_labels < 2 {
            return Err(crate::ConvNetError::Config(format!(
                "num_labels must be >= 2, got {}",
                self.num_labels
            )));
        }

        if self.kernel_size == 0 {
            return Err(crate::ConvNetError::Config(
                "kernel_size must be > 0".to_string(),
            ));
        }

        if self.conv1_features == 0 || self.conv2_features == 0 || self.hidden_size == 0 {
            return Err(crate::ConvNetError::Config(
                "layer widths must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Spatial size after the two 2x2 pooling stages
    pub fn pooled_size(&self) -> usize {
        self.image_size / 4
    }

    /// Length of the flattened feature vector fed to the first dense layer
    pub fn flat_features(&self) -> usize {
        self.pooled_size() * self.pooled_size() * self.conv2_features
    }

    /// Configuration for a dataset with the given channel count, other fields default
    pub fn with_channels(num_channels: usize) -> Self {
        Self {
            num_channels,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_rgbd_topology() {
        let config = NetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pooled_size(), 8);
        assert_eq!(config.flat_features(), 8 * 8 * 64);
    }

    #[test]
    fn test_rejects_image_size_not_divisible_by_four() {
        let config = NetConfig {
            image_size: 30,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(crate::ConvNetError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_zero_channels() {
        assert!(NetConfig::with_channels(0).validate().is_err());
        assert!(NetConfig::with_channels(3).validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NetConfig = serde_json::from_str(r#"{ "num_channels": 3 }"#).unwrap();
        assert_eq!(config.num_channels, 3);
        assert_eq!(config.image_size, 32);
        assert_eq!(config.hidden_size, 1024);
    }
}
