use super::encoder::FeatureEncoder;
use super::meta::{ModelMetadata, PreprocessSpec};
use super::spec::ModelSpec;
use super::{ModelArm, ModelError};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

const META_FILE: &str = "meta.json";
const PREPROCESS_FILE: &str = "preprocess.json";
const TREATED_FILE: &str = "treated.json";
const CONTROL_FILE: &str = "control.json";

/// Everything needed to turn an input table into prediction pairs.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub metadata: ModelMetadata,
    pub encoder: FeatureEncoder,
    pub treated: ModelSpec,
    pub control: ModelSpec,
}

impl ModelBundle {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ModelError> {
        let dir = dir.as_ref();
        let metadata: ModelMetadata = read_json(&dir.join(META_FILE))?;
        let preprocess: PreprocessSpec = read_json(&dir.join(PREPROCESS_FILE))?;
        let treated: ModelSpec = read_json(&dir.join(TREATED_FILE))?;
        let control: ModelSpec = read_json(&dir.join(CONTROL_FILE))?;

        let bundle = Self::new(metadata, &preprocess, treated, control)?;
        info!(
            dir = %dir.display(),
            features = bundle.metadata.feature_cols.len(),
            encoded_width = bundle.encoder.width(),
            "loaded model bundle"
        );
        Ok(bundle)
    }

    pub fn new(
        metadata: ModelMetadata,
        preprocess: &PreprocessSpec,
        treated: ModelSpec,
        control: ModelSpec,
    ) -> Result<Self, ModelError> {
        let encoder = FeatureEncoder::new(&metadata, preprocess);
        treated.validate(ModelArm::Treated, encoder.width())?;
        control.validate(ModelArm::Control, encoder.width())?;

        Ok(Self {
            metadata,
            encoder,
            treated,
            control,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
