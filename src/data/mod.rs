/// Dataset splits, loading and batch windowing
pub mod batching;
pub mod npy;
pub mod synthetic;

pub use batching::{eval_batches, BatchCursor, EvalChunks};
pub use npy::{read_data_sets, DatasetMetadata};
pub use synthetic::fake_data;

use crate::NetConfig;
use candle_core::{Device, Tensor};
use ndarray::{s, Array1, Array4, ArrayView1, ArrayView4};
use std::ops::Range;

/// One dataset partition: NHWC images paired 1:1 with class labels
#[derive(Debug, Clone)]
pub struct Split {
    images: Array4<f32>, // [N, H, W, C]
    labels: Array1<u32>, // [N]
}

impl Split {
    /// Create a split, checking that every image has a label
    pub fn new(images: Array4<f32>, labels: Array1<u32>) -> crate::Result<Self> {
        if images.shape()[0] != labels.len() {
            return Err(crate::ConvNetError::Data(format!(
                "Split has {} images but {} labels",
                images.shape()[0],
                labels.len()
            )));
        }

        Ok(Self { images, labels })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Image height (images are square)
    pub fn image_size(&self) -> usize {
        self.images.shape()[1]
    }

    /// Channels per pixel
    pub fn channels(&self) -> usize {
        self.images.shape()[3]
    }

    pub fn images(&self) -> ArrayView4<'_, f32> {
        self.images.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, u32> {
        self.labels.view()
    }

    /// Borrow the samples in `range` as a batch
    ///
    /// Panics if `range` is out of bounds; windows come from
    /// [`BatchCursor`] or [`EvalChunks`], which never exceed the split.
    pub fn batch(&self, range: Range<usize>) -> Batch<'_> {
        Batch {
            images: self.images.slice(s![range.clone(), .., .., ..]),
            labels: self.labels.slice(s![range]),
        }
    }
}

/// A contiguous, borrowed selection of samples from a [`Split`]
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    pub images: ArrayView4<'a, f32>,
    pub labels: ArrayView1<'a, u32>,
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Copy the batch to `device` as an `[B, H, W, C]` f32 tensor and a `[B]` u32 tensor
    pub fn to_tensors(&self, device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
        let shape = self.images.shape();
        let dims = (shape[0], shape[1], shape[2], shape[3]);

        let image_data: Vec<f32> = self.images.iter().copied().collect();
        let label_data: Vec<u32> = self.labels.iter().copied().collect();

        let images = Tensor::from_vec(image_data, dims, device)?;
        let labels = Tensor::from_vec(label_data, self.len(), device)?;

        Ok((images, labels))
    }
}

/// Train, validation and test splits sharing one image shape
#[derive(Debug, Clone)]
pub struct DataSets {
    pub train: Split,
    pub validation: Split,
    pub test: Split,
    metadata: DatasetMetadata,
}

impl DataSets {
    /// Bundle three splits, checking that their image shapes agree
    pub fn new(train: Split, validation: Split, test: Split) -> crate::Result<Self> {
        for (name, split) in [("validation", &validation), ("test", &test)] {
            if split.images.shape()[1..] != train.images.shape()[1..] {
                return Err(crate::ConvNetError::Data(format!(
                    "Shape mismatch: {} images {:?} != train images {:?}",
                    name,
                    &split.images.shape()[1..],
                    &train.images.shape()[1..]
                )));
            }
        }

        let metadata = DatasetMetadata {
            image_size: train.image_size(),
            ..DatasetMetadata::default()
        };

        Ok(Self {
            train,
            validation,
            test,
            metadata,
        })
    }

    /// Attach the metadata the splits were loaded with
    pub fn with_metadata(mut self, metadata: DatasetMetadata) -> crate::Result<Self> {
        if metadata.image_size != self.image_size() {
            return Err(crate::ConvNetError::Data(format!(
                "dataset.json declares {}x{} images but the splits are {}x{}",
                metadata.image_size,
                metadata.image_size,
                self.image_size(),
                self.image_size()
            )));
        }

        self.metadata = metadata;
        Ok(self)
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn image_size(&self) -> usize {
        self.train.image_size()
    }

    pub fn channels(&self) -> usize {
        self.train.channels()
    }

    /// Network topology matching these splits: image size, channels and label count
    pub fn net_config(&self) -> crate::Result<NetConfig> {
        let config = NetConfig {
            image_size: self.image_size(),
            num_labels: self.metadata.num_labels,
            ..NetConfig::with_channels(self.channels())
        };
        config.validate()?;
        Ok(config)
    }
}
