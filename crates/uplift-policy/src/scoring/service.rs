use std::sync::Arc;

use tracing::debug;

use super::domain::OutcomePrediction;
use super::error::ScoringError;
use super::pipeline::{evaluate, ScoringOutcome, ScoringRequest, ScoringSettings};
use crate::models::{
    predict_checked, FeatureEncoder, ModelArm, ModelBundle, ModelMetadata, ModelSpec,
    PredictiveModel,
};
use crate::table::FeatureTable;

/// Service owning the two read-only outcome models and their input schema.
///
/// Constructed once and shared by reference; scoring never mutates it.
pub struct ScoringService<T, C> {
    metadata: ModelMetadata,
    encoder: FeatureEncoder,
    treated: Arc<T>,
    control: Arc<C>,
    settings: ScoringSettings,
}

impl ScoringService<ModelSpec, ModelSpec> {
    pub fn from_bundle(bundle: ModelBundle, settings: ScoringSettings) -> Self {
        Self::new(
            bundle.metadata,
            bundle.encoder,
            Arc::new(bundle.treated),
            Arc::new(bundle.control),
            settings,
        )
    }
}

impl<T, C> ScoringService<T, C>
where
    T: PredictiveModel + 'static,
    C: PredictiveModel + 'static,
{
    pub fn new(
        metadata: ModelMetadata,
        encoder: FeatureEncoder,
        treated: Arc<T>,
        control: Arc<C>,
        settings: ScoringSettings,
    ) -> Self {
        Self {
            metadata,
            encoder,
            treated,
            control,
            settings,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    /// Validate, encode and predict a table, then run the decision pipeline.
    pub fn score_table(
        &self,
        table: &FeatureTable,
        request: &ScoringRequest,
    ) -> Result<ScoringOutcome, ScoringError> {
        request.economics()?;
        table.require_columns(self.metadata.feature_cols.as_slice())?;

        let (ids, id_source) =
            table.identifiers(request.id_column.as_deref(), &self.metadata.id_fallback);
        debug!(rows = table.len(), ?id_source, "resolved identifiers");

        let features = self.encoder.encode(table)?;
        let y1 = predict_checked(ModelArm::Treated, self.treated.as_ref(), &features)?;
        let y0 = predict_checked(ModelArm::Control, self.control.as_ref(), &features)?;

        let predictions = ids
            .into_iter()
            .zip(y1.into_iter().zip(y0))
            .map(|(id, (y1_hat, y0_hat))| OutcomePrediction { id, y1_hat, y0_hat })
            .collect();

        self.score_predictions(predictions, request)
    }

    /// Run the decision pipeline on prediction pairs produced elsewhere.
    pub fn score_predictions(
        &self,
        predictions: Vec<OutcomePrediction>,
        request: &ScoringRequest,
    ) -> Result<ScoringOutcome, ScoringError> {
        evaluate(predictions, request, &self.settings)
    }
}
