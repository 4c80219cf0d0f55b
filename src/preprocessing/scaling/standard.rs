//! Standard scaler (z-score normalization).
//!
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the per-feature mean of the training samples and `s` the
//! population standard deviation. Constant features get `s = 1`.

use crate::backend::{Backend, Tensor1D, Tensor2D};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// Center the data before scaling.
    pub with_mean: bool,
    /// Scale the data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Serializable parameters for a fitted scaler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StandardScalerParams {
    pub config: StandardScalerConfig,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub n_features: usize,
}

/// Unfitted standard scaler.
#[derive(Clone)]
pub struct StandardScaler<B: Backend> {
    config: StandardScalerConfig,
    _backend: PhantomData<B>,
}

impl<B: Backend> Default for StandardScaler<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> StandardScaler<B> {
    pub fn new() -> Self {
        Self {
            config: StandardScalerConfig::default(),
            _backend: PhantomData,
        }
    }

    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }
}

impl<B: Backend> Transformer<B> for StandardScaler<B> {
    type Input = Tensor2D<B>;
    type Output = Tensor2D<B>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler<B>;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        let (rows, cols) = data.shape();
        if rows == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let mean = if self.config.with_mean {
            data.col_mean()
        } else {
            Tensor1D::zeros(cols)
        };

        let std: Vec<f64> = if self.config.with_std {
            data.col_std(0)
                .to_vec()
                .into_iter()
                .map(|s| if s == 0.0 { 1.0 } else { s })
                .collect()
        } else {
            vec![1.0; cols]
        };

        Ok(FittedStandardScaler {
            config: self.config.clone(),
            mean,
            std: Tensor1D::from_f64(std),
            n_features: cols,
        })
    }
}

/// Fitted standard scaler.
#[derive(Clone)]
pub struct FittedStandardScaler<B: Backend> {
    config: StandardScalerConfig,
    mean: Tensor1D<B>,
    std: Tensor1D<B>,
    n_features: usize,
}

impl<B: Backend> FittedStandardScaler<B> {
    pub fn mean(&self) -> &Tensor1D<B> {
        &self.mean
    }

    pub fn std(&self) -> &Tensor1D<B> {
        &self.std
    }

    fn check_features(&self, data: &Tensor2D<B>) -> Result<(), PreprocessingError> {
        let cols = data.cols();
        if cols != self.n_features {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features,
                got_features: cols,
            });
        }
        Ok(())
    }
}

impl<B: Backend> FittedTransformer<B> for FittedStandardScaler<B> {
    type Input = Tensor2D<B>;
    type Output = Tensor2D<B>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.check_features(data)?;
        let mut out = data.clone();
        if self.config.with_mean {
            out = out.broadcast_sub_row(&self.mean);
        }
        if self.config.with_std {
            out = out.broadcast_div_row(&self.std);
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError> {
        self.check_features(data)?;
        let mut out = data.clone();
        if self.config.with_std {
            out = out.broadcast_mul_row(&self.std);
        }
        if self.config.with_mean {
            out = out.broadcast_add_row(&self.mean);
        }
        Ok(out)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            config: self.config.clone(),
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.mean.len() != params.n_features || params.std.len() != params.n_features {
            return Err(PreprocessingError::InvalidShape {
                expected: format!("{} features", params.n_features),
                got: format!("mean {}, std {}", params.mean.len(), params.std.len()),
            });
        }
        Ok(Self {
            mean: Tensor1D::from_f64(params.mean),
            std: Tensor1D::from_f64(params.std),
            config: params.config,
            n_features: params.n_features,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
