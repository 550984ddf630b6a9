use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uplift_policy::config::ScoringConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Per-route knobs for `POST /score`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RouteSettings {
    /// Economics applied when a request leaves them out.
    pub(crate) margin: f64,
    pub(crate) cost: f64,
    pub(crate) upload_max_bytes: usize,
    /// Ranked contacts echoed in `top`; the summary always covers the full selection.
    pub(crate) response_top_limit: usize,
}

impl From<&ScoringConfig> for RouteSettings {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            margin: config.margin,
            cost: config.cost,
            upload_max_bytes: config.upload_max_bytes,
            response_top_limit: config.response_top_limit,
        }
    }
}
