use crate::error::ApiError;
use crate::features::{validate_payload, FEATURE_COUNT};
use crate::model::artifact::ModelArtifact;
use anyhow::{anyhow, bail};
use log::debug;
use ndarray::Array2;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PredictionResponse {
    pub predictions: Vec<String>,
    pub probabilities: Vec<Vec<f64>>,
}

/// Runs both model capabilities over `features` and names the predicted classes.
/// Any failure here is internal: the input has already been validated.
pub async fn run_inference(
    artifact: &ModelArtifact,
    features: &Array2<f64>,
) -> anyhow::Result<PredictionResponse> {
    let start = Instant::now();
    let model = artifact.model();
    let n_rows = features.nrows();

    let indices = model.predict(features).await?;
    let proba = model.predict_proba(features).await?;

    if indices.len() != n_rows || proba.nrows() != n_rows {
        bail!(
            "model returned {} predictions and {} probability rows for {n_rows} inputs",
            indices.len(),
            proba.nrows()
        );
    }

    let names = artifact.target_names();
    let predictions = indices
        .iter()
        .map(|&i| {
            names
                .get(i)
                .cloned()
                .ok_or_else(|| anyhow!("class index {i} out of range for {} classes", names.len()))
        })
        .collect::<anyhow::Result<Vec<String>>>()?;
    let probabilities = proba.rows().into_iter().map(|row| row.to_vec()).collect();

    debug!("inference over {n_rows} rows took {:?}", start.elapsed());
    Ok(PredictionResponse {
        predictions,
        probabilities,
    })
}

/// Validates and predicts a single feature vector given outside of HTTP.
pub async fn predict_features(
    artifact: &ModelArtifact,
    features: &[f64],
) -> Result<PredictionResponse, ApiError> {
    let matrix = validate_payload(&json!({ "features": features }), FEATURE_COUNT)?;
    Ok(run_inference(artifact, &matrix).await?)
}
