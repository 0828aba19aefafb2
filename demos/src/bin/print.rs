//! Assembles a network and prints its structure, signature and parameter count.
//!
//! ## Usage
//!
//! ```bash
//! # Residual backbone network with default options
//! cargo run --bin print -- net --backbone resnet --n-filters 32 --n-blocks 4
//!
//! # Encoder-decoder with an auxiliary input on a 64x96 grid
//! cargo run --bin print -- unet --n-aux-channels 2 --height 64 --width 96 --decoder-upsampling spc
//!
//! # Load the configuration from a JSON file
//! cargo run --bin print -- unet --config unet.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use burn::prelude::*;
use clap::{Parser, ValueEnum};
use dl4ds_burn::{
    ActivationType, Backbone, DecoderUpsampling, DropoutVariant, ModelSignature, NetPinConfig,
    NormalizationType, UnetPinConfig,
};
use dl4ds_demos::{create_device, get_backend_name, init_tracing, SelectedBackend};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Architecture {
    /// Full-resolution backbone network
    Net,
    /// Encoder-decoder network
    Unet,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network family to build
    #[arg(value_enum, default_value = "net")]
    architecture: Architecture,

    /// JSON configuration file; overrides every other option
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backbone: convnet, resnet or densenet
    #[arg(long, default_value = "resnet")]
    backbone: Backbone,

    #[arg(long, default_value_t = 1)]
    n_channels: usize,

    #[arg(long, default_value_t = 0)]
    n_aux_channels: usize,

    #[arg(long, default_value_t = 32)]
    n_filters: usize,

    #[arg(long, default_value_t = 4)]
    n_blocks: usize,

    /// Target grid height
    #[arg(long, default_value_t = 64)]
    height: usize,

    /// Target grid width
    #[arg(long, default_value_t = 64)]
    width: usize,

    #[arg(long, default_value_t = 1)]
    n_channels_out: usize,

    #[arg(long, default_value = "relu")]
    activation: ActivationType,

    #[arg(long, default_value_t = 0.2)]
    dropout_rate: f64,

    #[arg(long, default_value = "spatial")]
    dropout_variant: DropoutVariant,

    /// Normalization inside convolution blocks: bn or ln
    #[arg(long)]
    normalization: Option<NormalizationType>,

    #[arg(long)]
    attention: bool,

    /// Encoder-decoder only: spc, rc or dc
    #[arg(long, default_value = "rc")]
    decoder_upsampling: DecoderUpsampling,

    #[arg(long)]
    output_activation: Option<ActivationType>,

    /// Add the localized convolution (fixes the input grid)
    #[arg(long)]
    localcon_layer: bool,
}

impl Args {
    fn net_config(&self) -> Result<NetPinConfig> {
        if let Some(path) = &self.config {
            return load_config(path);
        }
        Ok(NetPinConfig::new(
            self.backbone,
            self.n_channels,
            self.n_aux_channels,
            self.n_filters,
            self.n_blocks,
            [self.height, self.width],
        )
        .with_n_channels_out(self.n_channels_out)
        .with_activation(self.activation)
        .with_dropout_rate(self.dropout_rate)
        .with_dropout_variant(self.dropout_variant)
        .with_normalization(self.normalization)
        .with_attention(self.attention)
        .with_output_activation(self.output_activation)
        .with_localcon_layer(self.localcon_layer))
    }

    fn unet_config(&self) -> Result<UnetPinConfig> {
        if let Some(path) = &self.config {
            return load_config(path);
        }
        Ok(UnetPinConfig::new(
            self.backbone,
            self.n_channels,
            self.n_aux_channels,
            self.n_filters,
            self.n_blocks,
            [self.height, self.width],
        )
        .with_n_channels_out(self.n_channels_out)
        .with_activation(self.activation)
        .with_dropout_rate(self.dropout_rate)
        .with_dropout_variant(self.dropout_variant)
        .with_normalization(self.normalization)
        .with_attention(self.attention)
        .with_decoder_upsampling(self.decoder_upsampling)
        .with_output_activation(self.output_activation)
        .with_localcon_layer(self.localcon_layer))
    }
}

fn load_config<C: Config>(path: &Path) -> Result<C> {
    C::load(path).map_err(|err| anyhow!("failed to load {}: {err}", path.display()))
}

/// Zero tensors matching `signature` on `grid`.
fn dummy_inputs(
    signature: &ModelSignature,
    grid: [usize; 2],
    device: &Device<SelectedBackend>,
) -> (Tensor<SelectedBackend, 4>, Option<Tensor<SelectedBackend, 4>>) {
    let [height, width] = grid;
    let zeros = |channels: usize| -> Tensor<SelectedBackend, 4> {
        Tensor::zeros([1, channels, height, width], device)
    };
    let input = zeros(signature.inputs[0].channels);
    let aux = signature.inputs.get(1).map(|spec| zeros(spec.channels));
    (input, aux)
}

fn print_signature(signature: &ModelSignature) {
    println!("name: {}", signature.name);
    for spec in &signature.inputs {
        println!("input  {}: {spec}", spec.name);
    }
    println!("output {}: {}", signature.output.name, signature.output);
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let device = create_device();
    tracing::info!(
        backend = get_backend_name(),
        architecture = ?args.architecture,
        "building model"
    );

    match args.architecture {
        Architecture::Net => {
            let config = args.net_config()?;
            let model = config.init::<SelectedBackend>(&device)?;
            println!("{model}");
            print_signature(model.signature());
            println!("parameters: {}", model.num_params());

            let (input, aux) = dummy_inputs(model.signature(), config.hr_size, &device);
            let output = model.forward(input, aux)?;
            println!("forward on {:?}: {:?}", config.hr_size, output.dims());
        }
        Architecture::Unet => {
            let config = args.unet_config()?;
            let model = config.init::<SelectedBackend>(&device)?;
            println!("{model}");
            print_signature(model.signature());
            println!("depth: {} (requested {})", model.depth(), config.n_blocks);
            println!("encoder filters: {:?}", model.encoder_filters());
            println!("decoder filters: {:?}", model.decoder_filters());
            println!("parameters: {}", model.num_params());

            let (input, aux) = dummy_inputs(model.signature(), config.hr_size, &device);
            let output = model.forward(input, aux)?;
            println!("forward on {:?}: {:?}", config.hr_size, output.dims());
        }
    }

    Ok(())
}
