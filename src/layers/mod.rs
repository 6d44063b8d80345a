/// Neural network layer primitives
///
/// Building blocks for the RGB-D classifier:
/// - SAME-padded stride-1 convolution and 2x2 max pooling
/// - Dense (fully connected) layer
///
/// Weights start from N(0, 0.1²) and biases from 0.1; the training engine
/// redraws the weights from a truncated normal when it initialises.

pub mod conv;
pub mod dense;

pub use conv::{max_pool_2x2, same_padding, SameConv2d};
pub use dense::Dense;
