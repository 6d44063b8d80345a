/// NumPy dataset loader for the RGB-D_10 splits (.npy format)
///
/// Directory layout:
///
/// ```text
/// <dir>/dataset.json           optional metadata
/// <dir>/train_images.npy       f32 [N, H, W, 4]  (R, G, B, depth)
/// <dir>/train_labels.npy       i64 [N]
/// <dir>/validation_images.npy
/// <dir>/validation_labels.npy
/// <dir>/test_images.npy
/// <dir>/test_labels.npy
/// ```
use ndarray::{s, Array1, Array4};
use ndarray_npy::ReadNpyExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{DataSets, Split};

/// Metadata from dataset.json
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetMetadata {
    pub image_size: usize,
    pub num_labels: usize,
    #[serde(default)]
    pub description: String,
}

impl Default for DatasetMetadata {
    fn default() -> Self {
        Self {
            image_size: 32,
            num_labels: 10,
            description: "RGB-D_10".to_string(),
        }
    }
}

impl DatasetMetadata {
    /// Load `dataset.json` from `dir`, falling back to defaults when absent
    pub fn from_directory<P: AsRef<Path>>(dir: P) -> crate::Result<Self> {
        let metadata_path = dir.as_ref().join("dataset.json");
        if !metadata_path.exists() {
            log::warn!("dataset.json not found, using defaults");
            return Ok(Self::default());
        }

        let reader = BufReader::new(File::open(&metadata_path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Load the train, validation and test splits from `dir`
///
/// With `use_rgbd` the four stored channels are kept; otherwise only the
/// three colour channels are.
pub fn read_data_sets<P: AsRef<Path>>(dir: P, use_rgbd: bool) -> crate::Result<DataSets> {
    let dir = dir.as_ref();

    log::info!("Loading RGB-D dataset from: {:?}", dir);

    let metadata = DatasetMetadata::from_directory(dir)?;

    let train = read_split(dir, "train", use_rgbd, &metadata)?;
    let validation = read_split(dir, "validation", use_rgbd, &metadata)?;
    let test = read_split(dir, "test", use_rgbd, &metadata)?;

    log::info!(
        "Dataset loaded: train={}, validation={}, test={}, channels={}, description={}",
        train.len(),
        validation.len(),
        test.len(),
        train.channels(),
        metadata.description
    );

    DataSets::new(train, validation, test)?.with_metadata(metadata)
}

/// Load `<name>_images.npy` and `<name>_labels.npy`
pub fn read_split(
    dir: &Path,
    name: &str,
    use_rgbd: bool,
    metadata: &DatasetMetadata,
) -> crate::Result<Split> {
    let images_path = dir.join(format!("{}_images.npy", name));
    let images = Array4::<f32>::read_npy(File::open(&images_path)?)?;

    log::debug!("Loaded {}: shape {:?}", images_path.display(), images.shape());

    let shape = images.shape();
    if shape[1] != metadata.image_size || shape[2] != metadata.image_size {
        return Err(crate::ConvNetError::Data(format!(
            "{} images are {}x{}, expected {}x{}",
            name, shape[1], shape[2], metadata.image_size, metadata.image_size
        )));
    }

    let wanted_channels = if use_rgbd { 4 } else { 3 };
    if shape[3] < wanted_channels {
        return Err(crate::ConvNetError::Data(format!(
            "{} images have {} channels, need {}",
            name, shape[3], wanted_channels
        )));
    }

    let images = if shape[3] == wanted_channels {
        images
    } else {
        images.slice(s![.., .., .., ..wanted_channels]).to_owned()
    };

    // Labels are stored as int64
    let labels_path = dir.join(format!("{}_labels.npy", name));
    let labels_i64 = Array1::<i64>::read_npy(File::open(&labels_path)?)?;

    if let Some(bad) = labels_i64
        .iter()
        .find(|&&l| l < 0 || l as usize >= metadata.num_labels)
    {
        return Err(crate::ConvNetError::Data(format!(
            "{} contains label {} outside 0..{}",
            labels_path.display(),
            bad,
            metadata.num_labels
        )));
    }
    let labels = labels_i64.mapv(|l| l as u32);

    Split::new(images, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::WriteNpyExt;

    fn write_split(dir: &Path, name: &str, n: usize, labels: Vec<i64>) {
        write_sized_split(dir, name, n, 32, labels);
    }

    fn write_sized_split(dir: &Path, name: &str, n: usize, size: usize, labels: Vec<i64>) {
        let images = Array4::from_shape_fn((n, size, size, 4), |(i, _, _, c)| (i * 10 + c) as f32);
        images
            .write_npy(File::create(dir.join(format!("{}_images.npy", name))).unwrap())
            .unwrap();
        Array1::from_vec(labels)
            .write_npy(File::create(dir.join(format!("{}_labels.npy", name))).unwrap())
            .unwrap();
    }

    fn write_all(dir: &Path) {
        write_split(dir, "train", 6, vec![0, 1, 2, 3, 4, 5]);
        write_split(dir, "validation", 3, vec![9, 8, 7]);
        write_split(dir, "test", 2, vec![0, 0]);
    }

    #[test]
    fn test_metadata_deserialization() {
        let json = r#"{
            "image_size": 32,
            "num_labels": 10,
            "description": "RGB-D_10"
        }"#;

        let metadata: DatasetMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.image_size, 32);
        assert_eq!(metadata.num_labels, 10);
        assert_eq!(metadata.description, "RGB-D_10");
    }

    #[test]
    fn test_read_rgbd_keeps_depth() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());

        let data = read_data_sets(dir.path(), true).unwrap();
        assert_eq!(data.train.len(), 6);
        assert_eq!(data.validation.len(), 3);
        assert_eq!(data.test.len(), 2);
        assert_eq!(data.channels(), 4);
        assert_eq!(data.train.images()[[2, 0, 0, 3]], 23.0);
        assert_eq!(data.validation.labels().to_vec(), vec![9, 8, 7]);
    }

    #[test]
    fn test_read_rgb_drops_depth() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());

        let data = read_data_sets(dir.path(), false).unwrap();
        assert_eq!(data.channels(), 3);
        assert_eq!(data.test.images()[[1, 5, 5, 2]], 12.0);
    }

    #[test]
    fn test_rejects_out_of_range_label() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        write_split(dir.path(), "test", 2, vec![0, 10]);

        assert!(matches!(
            read_data_sets(dir.path(), true),
            Err(crate::ConvNetError::Data(_))
        ));
    }

    #[test]
    fn test_declared_label_count_reaches_net_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("dataset.json"),
            r#"{"image_size": 8, "num_labels": 12}"#,
        )
        .unwrap();
        write_sized_split(dir.path(), "train", 4, 8, vec![0, 5, 10, 11]);
        write_sized_split(dir.path(), "validation", 2, 8, vec![11, 3]);
        write_sized_split(dir.path(), "test", 2, 8, vec![10, 1]);

        let data = read_data_sets(dir.path(), true).unwrap();
        assert_eq!(data.metadata().num_labels, 12);

        let config = data.net_config().unwrap();
        assert_eq!(config.num_labels, 12);
        assert_eq!(config.image_size, 8);
        assert_eq!(config.num_channels, 4);
    }

    #[test]
    fn test_missing_split_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        write_split(dir.path(), "train", 2, vec![0, 1]);

        assert!(matches!(
            read_data_sets(dir.path(), true),
            Err(crate::ConvNetError::Io(_))
        ));
    }
}
