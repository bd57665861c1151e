use anyhow::{bail, Context, Result};
use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct FeedForwardConfig {
    pub num_inputs:  usize,
    /// Widths of the ReLU hidden layers; empty for a single linear neuron
    pub hidden:      Vec<usize>,
    pub num_outputs: usize,
    /// He-normal initialisation of the hidden layers
    #[config(default = false)]
    pub he_init:     bool,
}

impl FeedForwardConfig {
    /// Parse a structure string such as "15-10": every number but the
    /// last is a hidden layer, the last is the output width.
    pub fn from_structure(num_inputs: usize, structure: &str) -> Result<Self> {
        let widths = structure
            .split('-')
            .map(|w| {
                w.trim()
                    .parse::<usize>()
                    .with_context(|| format!("bad layer width '{w}' in structure '{structure}'"))
            })
            .collect::<Result<Vec<usize>>>()?;

        if widths.iter().any(|&w| w == 0) {
            bail!("layer widths must be positive in structure '{structure}'");
        }
        let (num_outputs, hidden) = match widths.split_last() {
            Some((last, rest)) => (*last, rest.to_vec()),
            None => bail!("empty network structure"),
        };
        Ok(Self::new(num_inputs, hidden, num_outputs))
    }

    /// `num_layers` hidden layers of `num_neurons` each, one output
    pub fn regression(num_inputs: usize, num_layers: usize, num_neurons: usize) -> Self {
        Self::new(num_inputs, vec![num_neurons; num_layers], 1)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> FeedForward<B> {
        let mut widths = Vec::with_capacity(self.hidden.len() + 1);
        widths.push(self.num_inputs);
        widths.extend_from_slice(&self.hidden);

        let hidden = widths
            .windows(2)
            .map(|w| self.hidden_layer(w[0], w[1], device))
            .collect();
        let last   = widths[widths.len() - 1];
        let output = LinearConfig::new(last, self.num_outputs).init(device);

        FeedForward { hidden, output }
    }

    fn hidden_layer<B: Backend>(&self, d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
        let config = LinearConfig::new(d_in, d_out);
        let config = if self.he_init {
            config.with_initializer(Initializer::KaimingNormal {
                gain:          std::f64::consts::SQRT_2,
                fan_out_only:  false,
            })
        } else {
            config
        };
        config.init(device)
    }
}

#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub hidden: Vec<Linear<B>>,
    pub output: Linear<B>,
}

impl<B: Backend> FeedForward<B> {
    /// features: [batch, num_inputs] → [batch, num_outputs]
    /// Hidden layers use ReLU, the output layer is linear (logits or
    /// the regression estimate).
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(features, |x, layer| relu(layer.forward(x)));
        self.output.forward(x)
    }
}
