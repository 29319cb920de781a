use anyhow;
use async_trait::async_trait;
use ndarray::{Array1, Array2};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Backend {
    #[serde(rename = "gaussian_nb")]
    GaussianNB,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::GaussianNB => "gaussian_nb",
        }
    }
}

/// The two capabilities a trained classifier exposes.
/// Row i of every output corresponds to row i of `features`.
#[async_trait]
pub trait ClassifierTrait {
    async fn predict(&self, features: &Array2<f64>) -> anyhow::Result<Array1<usize>>;
    async fn predict_proba(&self, features: &Array2<f64>) -> anyhow::Result<Array2<f64>>;
}

pub trait ModelTrait {
    fn backend(&self) -> Backend;
    fn n_features(&self) -> usize;
    fn n_classes(&self) -> usize;
}

pub trait Classifier: ClassifierTrait + ModelTrait + Send + Sync {}
impl<T> Classifier for T where T: ClassifierTrait + ModelTrait + Send + Sync {}
