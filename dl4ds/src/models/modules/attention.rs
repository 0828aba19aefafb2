use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
    tensor::activation::sigmoid,
};

/// Squeeze-and-excitation channel attention.
#[derive(Config, Debug)]
pub struct ChannelAttentionConfig {
    channels: usize,
    #[config(default = "4")]
    reduction: usize,
}

impl ChannelAttentionConfig {
    /// Width of the squeeze layer, at least one unit.
    #[must_use]
    pub fn hidden_channels(&self) -> usize {
        (self.channels / self.reduction.max(1)).max(1)
    }

    pub fn init<B: Backend>(&self, device: &Device<B>) -> ChannelAttention<B> {
        let hidden = self.hidden_channels();
        ChannelAttention {
            squeeze: LinearConfig::new(self.channels, hidden).init(device),
            excite: LinearConfig::new(hidden, self.channels).init(device),
            relu: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct ChannelAttention<B: Backend> {
    squeeze: Linear<B>,
    excite: Linear<B>,
    relu: Relu,
}

impl<B: Backend> ChannelAttention<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, _, _] = x.dims();

        let weights = x.clone().mean_dim(3).mean_dim(2).reshape([batch, channels]);
        let weights = self.relu.forward(self.squeeze.forward(weights));
        let weights = sigmoid(self.excite.forward(weights)).reshape([batch, channels, 1, 1]);

        x * weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_channel_attention_shape() {
        let device = Default::default();
        let attention = ChannelAttentionConfig::new(8).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::ones([2, 8, 5, 3], &device);

        assert_eq!(attention.forward(x).dims(), [2, 8, 5, 3]);
    }

    #[test]
    fn test_narrow_inputs_keep_one_hidden_unit() {
        assert_eq!(ChannelAttentionConfig::new(2).hidden_channels(), 1);
        assert_eq!(ChannelAttentionConfig::new(64).hidden_channels(), 16);
    }

    #[test]
    fn test_scale_stays_below_input() {
        let device = Default::default();
        let attention = ChannelAttentionConfig::new(4).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::ones([1, 4, 2, 2], &device);

        let y = attention.forward(x);
        let max = y.clone().max().into_scalar().elem::<f32>();
        let min = y.min().into_scalar().elem::<f32>();
        assert!(max < 1.0 && min > 0.0);
    }
}
