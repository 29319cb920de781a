use crate::error::ArtifactError;
use crate::features::FEATURE_COUNT;
use crate::model::backends::gaussian_nb::{GaussianNB, GaussianNBParams};
use crate::model::model_utils::Classifier;
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ModelSpec {
    #[serde(rename = "gaussian_nb")]
    GaussianNB(GaussianNBParams),
}

#[derive(Deserialize)]
struct ArtifactFile {
    model: ModelSpec,
    target_names: Vec<String>,
}

/// A trained classifier together with the names of the classes it predicts.
/// Built once at startup and shared read-only by every request.
pub struct ModelArtifact {
    model: Box<dyn Classifier>,
    target_names: Vec<String>,
}

impl ModelArtifact {
    pub fn new(
        model: Box<dyn Classifier>,
        target_names: Vec<String>,
    ) -> Result<Self, ArtifactError> {
        if target_names.len() != model.n_classes() {
            return Err(ArtifactError::Malformed(format!(
                "model has {} classes but {} target names",
                model.n_classes(),
                target_names.len()
            )));
        }
        if model.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::Malformed(format!(
                "model expects {} features, the service serves {FEATURE_COUNT}",
                model.n_features()
            )));
        }

        Ok(Self {
            model,
            target_names,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let file: ArtifactFile = serde_json::from_str(json)?;
        let model: Box<dyn Classifier> = match file.model {
            ModelSpec::GaussianNB(params) => Box::new(GaussianNB::from_params(params)?),
        };
        Self::new(model, file.target_names)
    }

    pub async fn load(path: &Path) -> Result<Self, ArtifactError> {
        let path_str = path.display().to_string();
        if !path.exists() {
            return Err(ArtifactError::NotFound(path_str));
        }

        let start = Instant::now();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path_str.clone(),
                source,
            })?;
        debug!("read {} bytes from {path_str}", json.len());

        let artifact = Self::from_json(&json)?;
        info!(
            "Loaded {} model from {path_str} in {:?}, classes: {:?}",
            artifact.model.backend().as_str(),
            start.elapsed(),
            artifact.target_names
        );
        Ok(artifact)
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }
}
