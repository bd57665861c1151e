// ============================================================
// Layer 4 — Tabular Batcher
// ============================================================
// Implements burn's Batcher trait to stack a Vec<TabularItem>
// into tensors:
//
//   features: [batch_size, feature_count]  (float)
//   targets:  [batch_size, 1]              (float, regression)
//   labels:   [batch_size]                 (int, classification)
//
// Both target views are built for every batch; the trainer's
// objective decides which one the loss reads.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::TabularItem;

#[derive(Debug, Clone)]
pub struct TabularBatch<B: Backend> {
    pub features: Tensor<B, 2>,
    pub targets:  Tensor<B, 2>,
    pub labels:   Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct TabularBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TabularBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TabularItem, TabularBatch<B>> for TabularBatcher<B> {
    fn batch(&self, items: Vec<TabularItem>) -> TabularBatch<B> {
        let batch_size = items.len();
        let width      = items.first().map_or(0, |i| i.features.len());

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|i| i.features.iter().copied())
            .collect();
        let targets: Vec<f32> = items.iter().map(|i| i.target).collect();
        let labels: Vec<i32>  = items.iter().map(|i| i.target as i32).collect();

        let features = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, width]);
        let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device)
            .reshape([batch_size, 1]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        TabularBatch { features, targets, labels }
    }
}
