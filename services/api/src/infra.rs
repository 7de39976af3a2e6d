use metrics_exporter_prometheus::PrometheusHandle;
use regscope::error::AppError;
use regscope::matching::{BusinessProfile, InMemoryRuleStore};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load the rule catalog that backs candidate retrieval.
pub(crate) fn load_rule_store(path: &Path) -> Result<InMemoryRuleStore, AppError> {
    let store = InMemoryRuleStore::from_path(path)?;
    info!(path = %path.display(), rules = store.len(), "rule catalog loaded");
    Ok(store)
}

pub(crate) fn load_profile(path: &Path) -> Result<BusinessProfile, AppError> {
    let file = File::open(path)?;
    let profile = serde_json::from_reader(BufReader::new(file))?;
    Ok(profile)
}
