/// Synthetic self-test data with the dimensions of the real dataset
use ndarray::{s, Array1, Array4};

use super::Split;

/// Generate `num_images` images of `image_size` x `image_size` x `channels`
///
/// Image `i` is labelled `i % 2` and channel 0 of every pixel holds
/// `label - 0.5`. Remaining channels are zero.
pub fn fake_data(num_images: usize, channels: usize, image_size: usize) -> Split {
    let mut images = Array4::<f32>::zeros((num_images, image_size, image_size, channels));
    let mut labels = Array1::<u32>::zeros(num_images);

    for image in 0..num_images {
        let label = (image % 2) as u32;
        if channels > 0 {
            images
                .slice_mut(s![image, .., .., 0])
                .fill(label as f32 - 0.5);
        }
        labels[image] = label;
    }

    Split { images, labels }
}
