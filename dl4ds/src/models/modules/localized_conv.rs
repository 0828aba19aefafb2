//! # Localized Convolution
//!
//! A 1x1 locally-connected layer: every grid position has its own
//! `[in_channels, filters]` weight matrix and bias, so the layer only accepts the
//! grid it was built for.

use burn::{module::Param, nn::Initializer, prelude::*};

use crate::error::{Dl4dsError, Dl4dsResult};

#[derive(Config, Debug)]
pub struct LocalizedConv2dConfig {
    pub in_channels: usize,
    pub filters: usize,
    pub height: usize,
    pub width: usize,
    #[config(default = true)]
    pub bias: bool,
}

impl LocalizedConv2dConfig {
    pub fn init<B: Backend>(&self, device: &Device<B>) -> LocalizedConv2d<B> {
        let initializer = Initializer::KaimingUniform {
            gain: 1.0 / 3.0f64.sqrt(),
            fan_out_only: false,
        };
        let weight = initializer.init_with(
            [self.in_channels, self.filters, self.height, self.width],
            Some(self.in_channels),
            Some(self.filters),
            device,
        );
        let shape = [self.filters, self.height, self.width];
        let bias = self.bias.then(|| Initializer::Zeros.init(shape, device));

        LocalizedConv2d { weight, bias }
    }
}

#[derive(Module, Debug)]
pub struct LocalizedConv2d<B: Backend> {
    /// `[in_channels, filters, height, width]`
    weight: Param<Tensor<B, 4>>,
    /// `[filters, height, width]`
    bias: Option<Param<Tensor<B, 3>>>,
}

impl<B: Backend> LocalizedConv2d<B> {
    /// The grid `[height, width]` the layer was built for.
    pub fn grid(&self) -> [usize; 2] {
        let [_, _, height, width] = self.weight.dims();
        [height, width]
    }

    /// # Errors
    ///
    /// Returns `Err(Dl4dsError::InvalidTensorShape)` if `x` is not
    /// `[batch, in_channels, height, width]` on the layer's grid.
    pub fn forward(&self, x: Tensor<B, 4>) -> Dl4dsResult<Tensor<B, 4>> {
        let [batch, channels, height, width] = x.dims();
        let [in_channels, _, grid_h, grid_w] = self.weight.dims();
        if (channels, height, width) != (in_channels, grid_h, grid_w) {
            return Err(Dl4dsError::InvalidTensorShape {
                tensor: "localized convolution input".to_string(),
                expected: format!("[_, {in_channels}, {grid_h}, {grid_w}]"),
                actual: format!("[{batch}, {channels}, {height}, {width}]"),
            });
        }

        // [b, c_in, 1, h, w] * [1, c_in, c_out, h, w], summed over c_in
        let y = x.unsqueeze_dim::<5>(2) * self.weight.val().unsqueeze::<5>();
        let y = y.sum_dim(1).squeeze::<4>(1);

        Ok(match &self.bias {
            Some(bias) => y + bias.val().unsqueeze::<4>(),
            None => y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let layer = LocalizedConv2dConfig::new(6, 2, 4, 5).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::ones([3, 6, 4, 5], &device);

        assert_eq!(layer.grid(), [4, 5]);
        assert_eq!(layer.forward(x).unwrap().dims(), [3, 2, 4, 5]);
    }

    #[test]
    fn test_rejects_other_grids() {
        let device = Default::default();
        let layer = LocalizedConv2dConfig::new(6, 2, 4, 5).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::ones([1, 6, 5, 4], &device);

        assert!(matches!(
            layer.forward(x),
            Err(Dl4dsError::InvalidTensorShape { .. })
        ));
    }

    #[test]
    fn test_weights_are_position_dependent() {
        let device = Default::default();
        let layer = LocalizedConv2dConfig::new(1, 1, 1, 2)
            .with_bias(false)
            .init::<TestBackend>(&device);
        let weight = Tensor::<TestBackend, 4>::from_data([[[[2.0, -3.0]]]], &device);
        let layer = LocalizedConv2d {
            weight: Param::from_tensor(weight),
            ..layer
        };

        let x = Tensor::<TestBackend, 4>::from_data([[[[1.0, 1.0]]]], &device);
        layer
            .forward(x)
            .unwrap()
            .to_data()
            .assert_eq(&TensorData::from([[[[2.0f32, -3.0]]]]), false);
    }
}
