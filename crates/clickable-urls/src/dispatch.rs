use anyhow::Result;
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

use crate::registry::DocumentId;
use crate::ClickableUrls;

pub const BROWSER_ERROR_MESSAGE: &str =
    "Failed to open browser. See \"Customizing the browser\" in the README.";

/// Where an opened URL went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlTarget {
    File,
    Browser,
}

impl ClickableUrls {
    /// URL at the host's current selection, see [`ClickableUrls::resolve_under_cursor`].
    pub async fn url_under_cursor(&self, document: DocumentId) -> Option<String> {
        let selection = self.host.documents.selection(document)?;
        self.resolve_under_cursor(document, selection).await
    }

    /// A non-empty selection is taken literally. A plain cursor picks the
    /// first stored URL containing it. Documents that were never scanned
    /// resolve to nothing.
    pub async fn resolve_under_cursor(
        &self,
        document: DocumentId,
        selection: Range<usize>,
    ) -> Option<String> {
        let urls = self.registry.urls(document).await?;

        let target = if selection.is_empty() {
            let cursor = selection.start;
            urls.iter().find(|url| url.contains(cursor))?.range()
        } else {
            selection
        };

        self.host.documents.substr(document, target)
    }

    /// Distinct URL strings of the document in first-occurrence order.
    pub async fn resolve_all(&self, document: DocumentId) -> Vec<String> {
        let urls = match self.registry.urls(document).await {
            Some(urls) if !urls.is_empty() => urls,
            _ => return Vec::new(),
        };
        let text = match self.host.documents.full_text(document) {
            Some(text) => text,
            None => return Vec::new(),
        };

        let mut seen = HashSet::new();
        urls.iter()
            .filter_map(|url| text.get(url.range()))
            .filter(|url| seen.insert(*url))
            .map(str::to_owned)
            .collect()
    }

    /// Local files open in the editor, everything else in the browser.
    /// A browser failure is reported to the user before being returned.
    pub async fn open_url(&self, url: &str) -> Result<UrlTarget> {
        let path = Path::new(url);
        if path.is_file() {
            log::info!("Opening local file: {}", path.display());
            self.host.workspace.open_file(path);
            return Ok(UrlTarget::File);
        }

        let settings = self.settings.load().await?;
        let browser = settings.clickable_urls_browser.as_deref();
        match self.host.browser.open_url(url, browser) {
            Ok(()) => {
                log::info!("Opened {} in {}", url, browser.unwrap_or("default browser"));
                Ok(UrlTarget::Browser)
            }
            Err(e) => {
                log::error!("Failed to open browser for {}: {:#}", url, e);
                self.host.workspace.error_message(BROWSER_ERROR_MESSAGE);
                Err(e)
            }
        }
    }

    /// Opens every distinct URL of the document and returns how many opened.
    /// A failure on one URL does not stop the rest.
    pub async fn open_all_urls(&self, document: DocumentId) -> usize {
        let mut opened = 0;
        for url in self.resolve_all(document).await {
            if self.open_url(&url).await.is_ok() {
                opened += 1;
            }
        }
        opened
    }
}
