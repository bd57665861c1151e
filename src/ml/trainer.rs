// ============================================================
// Layer 5 — Training Loop
// ============================================================
// The burn side of the training collaborator: builds fresh
// feed-forward models and fits them for a fixed number of epochs
// at a given mini-batch size.
//
// Backend notes:
//   - Training runs on TrainBackend (Autodiff<NdArray>, CPU)
//   - model.valid() returns the model on EvalBackend (NdArray)
//     so validation batches skip the autodiff bookkeeping
//   - The reported epoch loss is the sample-weighted mean of the
//     mini-batch losses seen during that epoch, like the running
//     average a framework history records
//
// Reference: Burn Book §5 (Training)

use anyhow::{anyhow, bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::{CrossEntropyLossConfig, MseLoss, Reduction},
    optim::{
        momentum::MomentumConfig, AdamConfig, GradientsParams, Optimizer, RmsPropConfig,
        SgdConfig,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::{TabularBatch, TabularBatcher},
    dataset::{TabularDataset, TabularItem},
};
use crate::domain::{
    sweep::{EpochLoss, LossTrajectory},
    traits::{ModelFactory, Trainer, TrainingOutcome},
};
use crate::ml::model::{FeedForward, FeedForwardConfig};

pub type TrainBackend = Autodiff<NdArray>;
pub type EvalBackend  = NdArray;

/// What the network is fitted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Cross-entropy on class indices (softmax over the logits)
    Classification,
    /// Mean squared error on a single output
    Regression,
}

impl Objective {
    fn loss<B: Backend>(&self, model: &FeedForward<B>, batch: TabularBatch<B>) -> Tensor<B, 1> {
        let output = model.forward(batch.features);
        match self {
            Objective::Classification => CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output, batch.labels),
            Objective::Regression => MseLoss::new().forward(output, batch.targets, Reduction::Mean),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// Plain SGD; momentum 0 disables the momentum term
    Sgd { momentum: f64 },
    Adam,
    RmsProp,
}

/// Training split plus an optional held-out split evaluated after
/// every epoch.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub train:      TabularDataset,
    pub validation: Option<TabularDataset>,
}

// ─── FeedForwardFactory ───────────────────────────────────────────────────────
pub struct FeedForwardFactory {
    config: FeedForwardConfig,
    device: NdArrayDevice,
}

impl FeedForwardFactory {
    pub fn new(config: FeedForwardConfig) -> Self {
        Self { config, device: NdArrayDevice::default() }
    }
}

impl ModelFactory for FeedForwardFactory {
    type Model = FeedForward<TrainBackend>;

    fn build_model(&self) -> Self::Model {
        let model: FeedForward<TrainBackend> = self.config.init(&self.device);
        tracing::debug!("Built model with {} parameters", model.num_params());
        model
    }
}

// ─── BurnTrainer ──────────────────────────────────────────────────────────────
pub struct BurnTrainer {
    objective:     Objective,
    optimizer:     OptimizerKind,
    learning_rate: f64,
    shuffle_seed:  u64,
    device:        NdArrayDevice,
}

impl BurnTrainer {
    pub fn new(objective: Objective, optimizer: OptimizerKind, learning_rate: f64) -> Self {
        Self {
            objective,
            optimizer,
            learning_rate,
            shuffle_seed: 42,
            device: NdArrayDevice::default(),
        }
    }

    /// Seed of the per-epoch shuffle of the training loader
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = seed;
        self
    }

    fn fit<O>(
        &self,
        mut model:  FeedForward<TrainBackend>,
        mut optim:  O,
        data:       &TrainingData,
        batch_size: usize,
        epochs:     usize,
    ) -> Result<TrainingOutcome<FeedForward<TrainBackend>>>
    where
        O: Optimizer<FeedForward<TrainBackend>, TrainBackend>,
    {
        let train_loader = DataLoaderBuilder::new(TabularBatcher::<TrainBackend>::new(self.device.clone()))
            .batch_size(batch_size)
            .shuffle(self.shuffle_seed)
            .num_workers(1)
            .build(data.train.clone());

        let mut losses = LossTrajectory::new();

        for epoch in 0..epochs {
            let mut loss_sum = 0.0f64;
            let mut seen     = 0usize;

            for batch in train_loader.iter() {
                let rows = batch.features.dims()[0];
                let loss = self.objective.loss(&model, batch);

                loss_sum += loss.clone().into_scalar().elem::<f64>() * rows as f64;
                seen     += rows;

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(self.learning_rate, model, grads);
            }

            let train_loss = loss_sum / seen.max(1) as f64;
            let val_loss = data
                .validation
                .as_ref()
                .filter(|v| v.sample_count() > 0)
                .map(|v| self.evaluate(&model.valid(), v, batch_size));

            if !train_loss.is_finite() {
                tracing::warn!("Training loss is {} at epoch {}", train_loss, epoch);
            }
            tracing::debug!(
                "Epoch {:>4}/{} | loss={:.6} | val_loss={}",
                epoch,
                epochs,
                train_loss,
                val_loss.map_or_else(|| "-".to_string(), |v| format!("{v:.6}")),
            );
            losses.push(EpochLoss::new(epoch, train_loss, val_loss));
        }

        Ok(TrainingOutcome { losses, model })
    }

    /// Sample-weighted mean loss of `model` over `data`
    pub fn evaluate(&self, model: &FeedForward<EvalBackend>, data: &TabularDataset, batch_size: usize) -> f64 {
        let loader = DataLoaderBuilder::new(TabularBatcher::<EvalBackend>::new(self.device.clone()))
            .batch_size(batch_size.max(1))
            .num_workers(1)
            .build(data.clone());

        let mut loss_sum = 0.0f64;
        let mut seen     = 0usize;
        for batch in loader.iter() {
            let rows = batch.features.dims()[0];
            loss_sum += self.objective.loss(model, batch).into_scalar().elem::<f64>() * rows as f64;
            seen     += rows;
        }
        if seen == 0 { f64::NAN } else { loss_sum / seen as f64 }
    }
}

impl Trainer for BurnTrainer {
    type Model = FeedForward<TrainBackend>;
    type Data  = TrainingData;

    fn train(
        &self,
        model:      Self::Model,
        data:       &Self::Data,
        batch_size: usize,
        epochs:     usize,
    ) -> Result<TrainingOutcome<Self::Model>> {
        if data.train.sample_count() == 0 {
            bail!("training set is empty");
        }
        if batch_size == 0 {
            bail!("mini-batch size must be positive");
        }

        match self.optimizer {
            OptimizerKind::Sgd { momentum } => {
                let momentum = (momentum > 0.0)
                    .then(|| MomentumConfig::new().with_momentum(momentum).with_dampening(0.0));
                let optim = SgdConfig::new()
                    .with_momentum(momentum)
                    .init::<TrainBackend, FeedForward<TrainBackend>>();
                self.fit(model, optim, data, batch_size, epochs)
            }
            OptimizerKind::Adam => {
                let optim = AdamConfig::new().init::<TrainBackend, FeedForward<TrainBackend>>();
                self.fit(model, optim, data, batch_size, epochs)
            }
            OptimizerKind::RmsProp => {
                let optim = RmsPropConfig::new()
                    .with_alpha(0.9)
                    .with_epsilon(1e-7)
                    .init::<TrainBackend, FeedForward<TrainBackend>>();
                self.fit(model, optim, data, batch_size, epochs)
            }
        }
    }
}

/// Raw network outputs for every row of `features`, one Vec per row.
pub fn predict(model: &FeedForward<EvalBackend>, features: &[Vec<f64>]) -> Result<Vec<Vec<f32>>> {
    if features.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<TabularItem> = features
        .iter()
        .map(|row| TabularItem {
            features: row.iter().map(|&v| v as f32).collect(),
            target:   0.0,
        })
        .collect();
    let batch  = TabularBatcher::<EvalBackend>::new(NdArrayDevice::default()).batch(items);
    let output = model.forward(batch.features);
    let [_, cols] = output.dims();

    let flat = output
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("cannot read model output: {e:?}"))?;
    Ok(flat.chunks(cols).map(<[f32]>::to_vec).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Dataset;

    fn line_data(n: usize) -> TabularDataset {
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 / n as f64]).collect();
        let targets = features.iter().map(|x| 2.0 * x[0] + 1.0).collect();
        TabularDataset::from_dataset(&Dataset::new(features, targets).unwrap())
    }

    #[test]
    fn test_regression_loss_decreases() {
        let factory = FeedForwardFactory::new(FeedForwardConfig::regression(1, 0, 1));
        let trainer = BurnTrainer::new(Objective::Regression, OptimizerKind::Adam, 0.05);
        let data = TrainingData { train: line_data(32), validation: Some(line_data(8)) };

        let outcome = trainer.train(factory.build_model(), &data, 8, 60).unwrap();
        assert_eq!(outcome.losses.len(), 60);
        let first = outcome.losses.iter().next().unwrap();
        let last  = outcome.losses.last().unwrap();
        assert!(last.loss < first.loss, "{} !< {}", last.loss, first.loss);
        assert!(last.val_loss.is_some());
    }

    #[test]
    fn test_classification_runs_with_sgd_momentum() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| if i % 2 == 0 { vec![0.0, 1.0] } else { vec![1.0, 0.0] })
            .collect();
        let labels: Vec<usize> = (0..20).map(|i| i % 2).collect();
        let data = TrainingData {
            train:      TabularDataset::from_dataset(&Dataset::new(features, labels).unwrap()),
            validation: None,
        };
        let factory = FeedForwardFactory::new(FeedForwardConfig::from_structure(2, "4-2").unwrap());
        let trainer = BurnTrainer::new(
            Objective::Classification,
            OptimizerKind::Sgd { momentum: 0.9 },
            0.05,
        );

        let outcome = trainer.train(factory.build_model(), &data, 5, 3).unwrap();
        assert_eq!(outcome.losses.len(), 3);
        assert!(outcome.losses.iter().all(|e| e.loss.is_finite() && e.val_loss.is_none()));
    }

    #[test]
    fn test_empty_training_set_fails() {
        let empty: Dataset<f64> = Dataset::empty(1);
        let data = TrainingData { train: TabularDataset::from_dataset(&empty), validation: None };
        let factory = FeedForwardFactory::new(FeedForwardConfig::regression(1, 0, 1));
        let trainer = BurnTrainer::new(Objective::Regression, OptimizerKind::RmsProp, 0.001);
        assert!(trainer.train(factory.build_model(), &data, 4, 1).is_err());
    }

    #[test]
    fn test_predict_one_row_per_input() {
        let model: FeedForward<EvalBackend> =
            FeedForwardConfig::from_structure(3, "5-2").unwrap().init(&NdArrayDevice::default());
        let out = predict(&model, &[vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.len() == 2));
        assert!(predict(&model, &[]).unwrap().is_empty());
    }
}
