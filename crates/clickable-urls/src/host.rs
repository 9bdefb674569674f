use anyhow::{Context, Result};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use crate::registry::{DocumentId, UrlRegion};

/// Read access to the host's open documents. Offsets are byte offsets.
pub trait DocumentSource: Send + Sync {
    fn full_text(&self, document: DocumentId) -> Option<String>;

    /// Lexical scope label at `offset`, as assigned by the host's highlighter.
    fn scope_name(&self, document: DocumentId, offset: usize) -> String;

    /// Primary selection; an empty range is a plain cursor.
    fn selection(&self, document: DocumentId) -> Option<Range<usize>>;

    fn substr(&self, document: DocumentId, range: Range<usize>) -> Option<String> {
        self.full_text(document)?.get(range).map(str::to_owned)
    }
}

/// Underline drawing. Every group is styled with a single scope.
pub trait MarkerRenderer: Send + Sync {
    fn add_markers(&self, document: DocumentId, key: &str, regions: &[UrlRegion], scope: &str);
    fn erase_markers(&self, document: DocumentId, key: &str);
}

pub trait BrowserLauncher: Send + Sync {
    /// `browser` names the application to use; `None` means the system default.
    fn open_url(&self, url: &str, browser: Option<&str>) -> Result<()>;
}

/// Editor window actions the plugin may request.
pub trait Workspace: Send + Sync {
    fn open_file(&self, path: &Path);
    fn error_message(&self, message: &str);
}

/// Launches URLs through the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open_url(&self, url: &str, browser: Option<&str>) -> Result<()> {
        match browser {
            Some(app) => open::with(url, app)
                .with_context(|| format!("Failed to open {} with {}", url, app)),
            None => open::that(url).with_context(|| format!("Failed to open {}", url)),
        }
    }
}

/// Collaborators the plugin talks to
#[derive(Clone)]
pub struct HostBindings {
    pub documents: Arc<dyn DocumentSource>,
    pub markers: Arc<dyn MarkerRenderer>,
    pub browser: Arc<dyn BrowserLauncher>,
    pub workspace: Arc<dyn Workspace>,
}

impl HostBindings {
    /// Bindings for a host that implements every editor-side trait itself.
    pub fn from_host<H>(host: Arc<H>, browser: Arc<dyn BrowserLauncher>) -> Self
    where
        H: DocumentSource + MarkerRenderer + Workspace + 'static,
    {
        Self {
            documents: host.clone(),
            markers: host.clone(),
            browser,
            workspace: host,
        }
    }
}
