use std::sync::Arc;
use tokio::sync::Mutex;

mod dispatch;
mod highlighter;
pub mod host;
mod plugin;
pub mod registry;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use dispatch::{UrlTarget, BROWSER_ERROR_MESSAGE};
pub use highlighter::ScanOutcome;
pub use host::{
    BrowserLauncher, DocumentSource, HostBindings, MarkerRenderer, SystemBrowser, Workspace,
};
pub use plugin::UrlCommand;
pub use registry::{DocumentId, ScanState, UrlRegion, UrlRegistry};
pub use settings::{SettingsFile, SettingsSource, UrlSettings};

/// Serialises scan/store/highlight cycles across every document.
pub type ScanGate = Arc<Mutex<()>>;

// プラグイン本体
pub struct ClickableUrls {
    host: HostBindings,
    settings: Arc<dyn SettingsSource>,
    registry: Arc<UrlRegistry>,
    gate: ScanGate,
}

impl ClickableUrls {
    pub fn new(host: HostBindings, settings: Arc<dyn SettingsSource>) -> Self {
        Self::with_gate(host, settings, Arc::new(Mutex::new(())))
    }

    /// Uses an externally owned gate, e.g. one shared with other plugins
    /// that must not scan concurrently.
    pub fn with_gate(
        host: HostBindings,
        settings: Arc<dyn SettingsSource>,
        gate: ScanGate,
    ) -> Self {
        Self {
            host,
            settings,
            registry: Arc::new(UrlRegistry::new()),
            gate,
        }
    }

    pub fn registry(&self) -> &UrlRegistry {
        &self.registry
    }

    pub async fn state(&self, document: DocumentId) -> ScanState {
        self.registry.state(document).await
    }
}

impl Clone for ClickableUrls {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            settings: self.settings.clone(),
            registry: self.registry.clone(),
            gate: self.gate.clone(),
        }
    }
}
