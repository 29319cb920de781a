use crate::error::ArtifactError;
use crate::model::model_utils::{Backend, ClassifierTrait, ModelTrait};
use anyhow::{self, bail};
use async_trait::async_trait;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::Deserialize;
use std::f64::consts::PI;
use std::time::Instant;

/// Fitted parameters as they are stored in the artifact file.
#[derive(Deserialize, Clone, Debug)]
pub struct GaussianNBParams {
    pub class_prior: Vec<f64>,
    pub theta: Vec<Vec<f64>>,
    pub var: Vec<Vec<f64>>,
}

/// Gaussian naive Bayes classifier with per-class feature means and variances.
pub struct GaussianNB {
    theta: Array2<f64>,
    var: Array2<f64>,
    // log prior minus the gaussian normalizer, per class
    log_norm: Array1<f64>,
}

impl GaussianNB {
    pub fn from_params(params: GaussianNBParams) -> Result<Self, ArtifactError> {
        let n_classes = params.class_prior.len();
        if n_classes == 0 {
            return Err(ArtifactError::Malformed(
                "model must have at least one class".to_string(),
            ));
        }

        let theta = to_matrix("theta", params.theta, n_classes)?;
        let var = to_matrix("var", params.var, n_classes)?;
        if theta.dim() != var.dim() {
            return Err(ArtifactError::Malformed(format!(
                "theta has shape {:?} but var has shape {:?}",
                theta.dim(),
                var.dim()
            )));
        }
        if var.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ArtifactError::Malformed(
                "variances must be finite and positive".to_string(),
            ));
        }
        if theta.iter().any(|t| !t.is_finite()) {
            return Err(ArtifactError::Malformed("means must be finite".to_string()));
        }
        if params
            .class_prior
            .iter()
            .any(|p| !p.is_finite() || *p <= 0.0)
        {
            return Err(ArtifactError::Malformed(
                "class priors must be finite and positive".to_string(),
            ));
        }

        let log_norm = Array1::from_shape_fn(n_classes, |c| {
            let log_det: f64 = var.row(c).iter().map(|v| (2.0 * PI * v).ln()).sum();
            params.class_prior[c].ln() - 0.5 * log_det
        });

        Ok(Self {
            theta,
            var,
            log_norm,
        })
    }

    fn joint_log_likelihood(&self, x: ArrayView1<f64>) -> Array1<f64> {
        Array1::from_shape_fn(self.log_norm.len(), |c| {
            let diff = &x - &self.theta.row(c);
            let scaled = &diff * &diff / &self.var.row(c);
            self.log_norm[c] - 0.5 * scaled.sum()
        })
    }

    fn score_rows(&self, features: &Array2<f64>) -> anyhow::Result<Vec<Array1<f64>>> {
        if features.ncols() != self.n_features() {
            bail!(
                "expected {} features, got {}",
                self.n_features(),
                features.ncols()
            );
        }

        let start = Instant::now();
        let scores: Vec<Array1<f64>> = (0..features.nrows())
            .into_par_iter()
            .map(|i| self.joint_log_likelihood(features.row(i)))
            .collect();
        // a row whose best score overflowed cannot be normalized
        if let Some(row) = scores.iter().position(|jll| !max_score(jll).is_finite()) {
            bail!("log-likelihood of row {row} is not finite");
        }
        debug!(
            "scored {} rows in {:?}",
            features.nrows(),
            start.elapsed()
        );
        Ok(scores)
    }
}

fn to_matrix(
    name: &str,
    rows: Vec<Vec<f64>>,
    n_classes: usize,
) -> Result<Array2<f64>, ArtifactError> {
    if rows.len() != n_classes {
        return Err(ArtifactError::Malformed(format!(
            "{name} has {} rows but there are {n_classes} classes",
            rows.len()
        )));
    }
    let width = rows[0].len();
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        return Err(ArtifactError::Malformed(format!(
            "{name} must be a non-empty rectangular matrix"
        )));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_classes, width), flat)
        .map_err(|e| ArtifactError::Malformed(e.to_string()))
}

fn max_score(jll: &Array1<f64>) -> f64 {
    jll.fold(f64::NEG_INFINITY, |acc, v| acc.max(*v))
}

// first maximum wins on ties
fn argmax(row: &Array1<f64>) -> Option<usize> {
    row.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

fn normalize(jll: &Array1<f64>) -> Array1<f64> {
    let max = max_score(jll);
    let log_sum = max + jll.mapv(|v| (v - max).exp()).sum().ln();
    jll.mapv(|v| (v - log_sum).exp())
}

#[async_trait]
impl ClassifierTrait for GaussianNB {
    async fn predict(&self, features: &Array2<f64>) -> anyhow::Result<Array1<usize>> {
        let scores = self.score_rows(features)?;
        scores
            .iter()
            .map(|jll| argmax(jll).ok_or_else(|| anyhow::anyhow!("model has no classes")))
            .collect::<anyhow::Result<Vec<usize>>>()
            .map(Array1::from)
    }

    async fn predict_proba(&self, features: &Array2<f64>) -> anyhow::Result<Array2<f64>> {
        let scores = self.score_rows(features)?;
        let mut proba = Array2::zeros((scores.len(), self.n_classes()));
        for (mut out, jll) in proba.axis_iter_mut(Axis(0)).zip(scores.iter()) {
            out.assign(&normalize(jll));
        }
        Ok(proba)
    }
}

impl ModelTrait for GaussianNB {
    fn backend(&self) -> Backend {
        Backend::GaussianNB
    }

    fn n_features(&self) -> usize {
        self.theta.ncols()
    }

    fn n_classes(&self) -> usize {
        self.theta.nrows()
    }
}
