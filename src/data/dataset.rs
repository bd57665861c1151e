use std::sync::Arc;

use burn::data::dataset::Dataset as BurnDataset;

use crate::domain::dataset::Dataset;

/// One record converted to burn's f32 world.
/// Class labels are carried as their index in `target`.
#[derive(Debug, Clone)]
pub struct TabularItem {
    pub features: Vec<f32>,
    pub target:   f32,
}

/// Targets that can be fed to the trainer
pub trait TargetValue {
    fn as_target(&self) -> f32;
}

impl TargetValue for f64 {
    fn as_target(&self) -> f32 {
        *self as f32
    }
}

impl TargetValue for usize {
    fn as_target(&self) -> f32 {
        *self as f32
    }
}

/// Items are shared behind an Arc so one dataset can back several
/// data loaders (one per mini-batch size) without copying.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    items:         Arc<Vec<TabularItem>>,
    feature_count: usize,
}

impl TabularDataset {
    pub fn from_dataset<T: TargetValue>(dataset: &Dataset<T>) -> Self {
        let items = dataset
            .iter()
            .map(|(row, target)| TabularItem {
                features: row.iter().map(|&v| v as f32).collect(),
                target:   target.as_target(),
            })
            .collect();
        Self { items: Arc::new(items), feature_count: dataset.feature_count() }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn sample_count(&self) -> usize {
        self.items.len()
    }
}

impl BurnDataset<TabularItem> for TabularDataset {
    fn get(&self, index: usize) -> Option<TabularItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_labels_become_indices() {
        let ds = Dataset::new(vec![vec![0.5, 1.0], vec![0.0, 0.25]], vec![3usize, 7]).unwrap();
        let tabular = TabularDataset::from_dataset(&ds);
        assert_eq!(tabular.len(), 2);
        assert_eq!(tabular.feature_count(), 2);
        let item = tabular.get(1).unwrap();
        assert_eq!(item.target, 7.0);
        assert_eq!(item.features, vec![0.0, 0.25]);
        assert!(tabular.get(2).is_none());
    }
}
