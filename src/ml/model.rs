use anyhow::{bail, ensure, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::{MseLoss, Reduction},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::leaky_relu,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Layer stack to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    /// Five conv layers with LeakyReLU, "same" pooling and heavy dropout
    Deep,
    /// Two 5×5 conv layers with ReLU and plain pooling
    LeNet,
}

impl FromStr for Architecture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "deep"  => Ok(Architecture::Deep),
            "lenet" => Ok(Architecture::LeNet),
            other   => bail!("unknown architecture '{other}' (expected 'deep' or 'lenet')"),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::Deep  => write!(f, "deep"),
            Architecture::LeNet => write!(f, "lenet"),
        }
    }
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally. Do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SteeringModelConfig {
    #[config(default = "Architecture::Deep")]
    pub architecture: Architecture,
    #[config(default = 160)]
    pub image_height: usize,
    #[config(default = 320)]
    pub image_width: usize,
    /// Rows removed from the top (sky, trees)
    #[config(default = 70)]
    pub crop_top: usize,
    /// Rows removed from the bottom (car hood)
    #[config(default = 25)]
    pub crop_bottom: usize,
}

// ─── Layer plan ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Padding {
    Valid,
    Same,
}

#[derive(Debug, Clone, Copy)]
struct ConvSpec {
    filters:        usize,
    kernel:         [usize; 2],
    stride:         usize,
    padding:        Padding,
    negative_slope: f64,
    pool:           Option<Padding>,
    dropout:        Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct DenseSpec {
    dropout_before: Option<f64>,
    units:          usize,
}

/// One conv block with its resolved paddings and output size
#[derive(Debug, Clone)]
struct ResolvedConv {
    spec:         ConvSpec,
    in_channels:  usize,
    conv_padding: [usize; 2],
    /// Cells appended after the last row / column before pooling
    pool_trailing: [usize; 2],
}

/// Shapes resolved for a concrete input size
#[derive(Debug, Clone)]
pub struct LayerPlan {
    convs:        Vec<ResolvedConv>,
    dense:        Vec<DenseSpec>,
    /// [channels, height, width] entering the first conv
    pub input:    [usize; 3],
    /// [channels, height, width] leaving the last conv
    pub features: [usize; 3],
}

impl LayerPlan {
    pub fn flat_features(&self) -> usize {
        self.features.iter().product()
    }
}

fn conv_specs(arch: Architecture) -> Vec<ConvSpec> {
    const SLOPE: f64 = 0.3;
    let block = |filters, kernel, stride, padding, pool, dropout| ConvSpec {
        filters, kernel, stride, padding, negative_slope: SLOPE, pool, dropout,
    };
    match arch {
        Architecture::Deep => vec![
            block(20,  [3, 3], 2, Padding::Valid, Some(Padding::Same), Some(0.1)),
            block(40,  [1, 1], 1, Padding::Same,  Some(Padding::Same), Some(0.1)),
            block(60,  [3, 3], 1, Padding::Same,  Some(Padding::Same), Some(0.1)),
            block(120, [1, 1], 1, Padding::Same,  None,                Some(0.1)),
            block(200, [3, 3], 1, Padding::Valid, None,                None),
        ],
        Architecture::LeNet => vec![
            ConvSpec { negative_slope: 0.0, ..block(6, [5, 5], 1, Padding::Valid, Some(Padding::Valid), None) },
            ConvSpec { negative_slope: 0.0, ..block(6, [5, 6], 1, Padding::Valid, Some(Padding::Valid), None) },
        ],
    }
}

fn dense_specs(arch: Architecture) -> Vec<DenseSpec> {
    let dense = |dropout_before, units| DenseSpec { dropout_before, units };
    match arch {
        Architecture::Deep => vec![
            dense(Some(0.1),  100),
            dense(Some(0.4),  40),
            dense(Some(0.75), 10),
            dense(None,       1),
        ],
        Architecture::LeNet => vec![
            dense(None, 120),
            dense(None, 84),
            dense(None, 1),
        ],
    }
}

/// Output length and symmetric padding of a convolution along one axis
fn conv_axis(n: usize, kernel: usize, stride: usize, padding: Padding) -> Result<(usize, usize)> {
    match padding {
        Padding::Valid => {
            ensure!(n >= kernel, "input of {n} is smaller than kernel {kernel}");
            Ok(((n - kernel) / stride + 1, 0))
        }
        Padding::Same => {
            ensure!(
                stride == 1 && kernel % 2 == 1,
                "same padding needs stride 1 and an odd kernel (got stride {stride}, kernel {kernel})"
            );
            Ok((n, (kernel - 1) / 2))
        }
    }
}

/// Output length and padding of a 2×2/stride-2 max pool along one axis.
/// "Same" pooling keeps the trailing odd row/column: ceil(n / 2).
fn pool_axis(n: usize, padding: Padding) -> Result<(usize, usize)> {
    ensure!(n >= 1, "cannot pool an empty axis");
    match padding {
        Padding::Valid => {
            ensure!(n >= 2, "input of {n} is smaller than the 2x2 pool");
            Ok((n / 2, 0))
        }
        // One extra cell after the end of an odd axis gives ceil(n / 2)
        // windows; windows still start at 0, 2, 4, ...
        Padding::Same => Ok(((n + 1) / 2, n % 2)),
    }
}

impl SteeringModelConfig {
    /// Height of the frame after cropping
    pub fn cropped_height(&self) -> Result<usize> {
        let removed = self.crop_top + self.crop_bottom;
        ensure!(
            removed < self.image_height,
            "cropping {} rows leaves nothing of a {}-row image",
            removed,
            self.image_height
        );
        Ok(self.image_height - removed)
    }

    /// Walk every layer and resolve paddings and output shapes.
    pub fn plan(&self) -> Result<LayerPlan> {
        let height = self.cropped_height()?;
        let width  = self.image_width;
        let mut shape = [3usize, height, width];

        let mut convs = Vec::new();
        for (i, spec) in conv_specs(self.architecture).into_iter().enumerate() {
            let layer = || format!("conv layer {} of '{}'", i + 1, self.architecture);

            let (h, ph) = conv_axis(shape[1], spec.kernel[0], spec.stride, spec.padding)
                .map_err(|e| e.context(layer()))?;
            let (w, pw) = conv_axis(shape[2], spec.kernel[1], spec.stride, spec.padding)
                .map_err(|e| e.context(layer()))?;

            let (h, w, pool_trailing) = match spec.pool {
                Some(p) => {
                    let (h, qh) = pool_axis(h, p).map_err(|e| e.context(layer()))?;
                    let (w, qw) = pool_axis(w, p).map_err(|e| e.context(layer()))?;
                    (h, w, [qh, qw])
                }
                None => (h, w, [0, 0]),
            };

            convs.push(ResolvedConv {
                spec,
                in_channels:  shape[0],
                conv_padding: [ph, pw],
                pool_trailing,
            });
            shape = [spec.filters, h, w];
        }

        Ok(LayerPlan {
            convs,
            dense:    dense_specs(self.architecture),
            input:    [3, height, width],
            features: shape,
        })
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<SteeringModel<B>> {
        let plan = self.plan()?;

        let blocks = plan
            .convs
            .iter()
            .map(|c| {
                let conv = Conv2dConfig::new([c.in_channels, c.spec.filters], c.spec.kernel)
                    .with_stride([c.spec.stride, c.spec.stride])
                    .with_padding(PaddingConfig2d::Explicit(c.conv_padding[0], c.conv_padding[1]))
                    .init(device);
                let pool = c.spec.pool.map(|_| {
                    MaxPool2dConfig::new([2, 2])
                        .with_strides([2, 2])
                        .init()
                });
                let dropout = c.spec.dropout.map(|p| DropoutConfig::new(p).init());
                ConvBlock {
                    conv,
                    pool,
                    dropout,
                    negative_slope: c.spec.negative_slope,
                    pad_bottom:     c.pool_trailing[0],
                    pad_right:      c.pool_trailing[1],
                }
            })
            .collect();

        let mut in_features = plan.flat_features();
        let head = plan
            .dense
            .iter()
            .map(|d| {
                let linear = LinearConfig::new(in_features, d.units).init(device);
                in_features = d.units;
                DenseBlock { dropout: d.dropout_before.map(|p| DropoutConfig::new(p).init()), linear }
            })
            .collect();

        let model = SteeringModel {
            blocks,
            head,
            crop_top:    self.crop_top,
            crop_bottom: self.crop_bottom,
        };

        tracing::info!(
            "Model '{}': input {:?} → features {:?} ({} flattened), {} parameters",
            self.architecture,
            plan.input,
            plan.features,
            plan.flat_features(),
            model.num_params(),
        );

        Ok(model)
    }
}

// ─── Modules ──────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:           Conv2d<B>,
    pub pool:           Option<MaxPool2d>,
    pub dropout:        Option<Dropout>,
    /// 0.0 makes the activation a plain ReLU
    pub negative_slope: f64,
    /// "same" pooling pads only the bottom and right edges
    pub pad_bottom:     usize,
    pub pad_right:      usize,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = leaky_relu(self.conv.forward(x), self.negative_slope);
        let x = match &self.pool {
            Some(pool) => pool.forward(pad_trailing(x, self.pad_bottom, self.pad_right)),
            None       => x,
        };
        match &self.dropout {
            Some(dropout) => dropout.forward(x),
            None          => x,
        }
    }
}

/// Append `bottom` rows and `right` columns of -inf so they never win a max.
fn pad_trailing<B: Backend>(x: Tensor<B, 4>, bottom: usize, right: usize) -> Tensor<B, 4> {
    if bottom == 0 && right == 0 {
        return x;
    }
    x.pad((0, right, 0, bottom), f32::NEG_INFINITY)
}

#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    pub dropout: Option<Dropout>,
    pub linear:  Linear<B>,
}

impl<B: Backend> DenseBlock<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = match &self.dropout {
            Some(dropout) => dropout.forward(x),
            None          => x,
        };
        self.linear.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct SteeringModel<B: Backend> {
    pub blocks:      Vec<ConvBlock<B>>,
    pub head:        Vec<DenseBlock<B>>,
    pub crop_top:    usize,
    pub crop_bottom: usize,
}

impl<B: Backend> SteeringModel<B> {
    /// images: [batch, 3, height, width] in 0..=255 → angles: [batch, 1]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch, channels, height, width] = images.dims();

        let x = images.slice([
            0..batch,
            0..channels,
            self.crop_top..height - self.crop_bottom,
            0..width,
        ]);
        // Centre pixel values on zero: [0, 255] → [-0.5, 0.5]
        let mut x = x.div_scalar(255.0).sub_scalar(0.5);

        for block in &self.blocks {
            x = block.forward(x);
        }

        let mut x = x.flatten::<2>(1, 3);
        for dense in &self.head {
            x = dense.forward(x);
        }
        x
    }

    /// Mean squared error against `targets` ([batch, 1]).
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let output = self.forward(images);
        let loss   = MseLoss::new().forward(output.clone(), targets, Reduction::Mean);
        (loss, output)
    }
}
