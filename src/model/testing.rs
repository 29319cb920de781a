use crate::model::model_utils::{Backend, ClassifierTrait, ModelTrait};
use anyhow::bail;
use async_trait::async_trait;
use ndarray::{Array1, Array2};

/// Predicts the class whose index is the first feature, truncated.
/// Only non-negative integer first features are meaningful: negatives and
/// fractions saturate or truncate through `as usize`.
#[derive(Default)]
pub struct StubClassifier {
    pub fail: bool,
    pub drop_last_row: bool,
}

impl StubClassifier {
    fn rows(&self, features: &Array2<f64>) -> usize {
        if self.drop_last_row {
            features.nrows().saturating_sub(1)
        } else {
            features.nrows()
        }
    }
}

#[async_trait]
impl ClassifierTrait for StubClassifier {
    async fn predict(&self, features: &Array2<f64>) -> anyhow::Result<Array1<usize>> {
        if self.fail {
            bail!("stub failure");
        }
        let n = self.rows(features);
        Ok(Array1::from_shape_fn(n, |i| features[[i, 0]] as usize))
    }

    async fn predict_proba(&self, features: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        if self.fail {
            bail!("stub failure");
        }
        let n = self.rows(features);
        Ok(Array2::from_shape_fn((n, 3), |(i, c)| {
            let class = features[[i, 0]] as usize;
            match class {
                0..=2 if class == c => 1.0,
                0..=2 => 0.0,
                _ => 1.0 / 3.0,
            }
        }))
    }
}

impl ModelTrait for StubClassifier {
    fn backend(&self) -> Backend {
        Backend::GaussianNB
    }

    fn n_features(&self) -> usize {
        4
    }

    fn n_classes(&self) -> usize {
        3
    }
}
