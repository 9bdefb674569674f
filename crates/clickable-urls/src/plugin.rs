use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use urlcore::marker_key;

use crate::highlighter::ScanOutcome;
use crate::registry::DocumentId;
use crate::ClickableUrls;

/// Commands exposed to the host's command palette and key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlCommand {
    /// Rescan now, even when `auto_find_urls` is off.
    FindUrls,
    OpenUrlUnderCursor,
    OpenAllUrls,
}

impl UrlCommand {
    pub const ALL: [UrlCommand; 3] = [
        UrlCommand::FindUrls,
        UrlCommand::OpenUrlUnderCursor,
        UrlCommand::OpenAllUrls,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UrlCommand::FindUrls => "find_urls",
            UrlCommand::OpenUrlUnderCursor => "open_url_under_cursor",
            UrlCommand::OpenAllUrls => "open_all_urls",
        }
    }

}

impl fmt::Display for UrlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UrlCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        UrlCommand::ALL
            .into_iter()
            .find(|command| command.name() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("Unknown command: {}", s))
    }
}

// エディタイベント
impl ClickableUrls {
    pub async fn on_activated(&self, document: DocumentId) {
        self.rescan_for_event(document, "activated").await;
    }

    pub async fn on_load(&self, document: DocumentId) {
        self.rescan_for_event(document, "load").await;
    }

    pub async fn on_modified(&self, document: DocumentId) {
        self.rescan_for_event(document, "modified").await;
    }

    /// Forgets everything about the document, ignore set included. Waits
    /// for any scan in progress so it cannot store into a closed document.
    pub async fn on_close(&self, document: DocumentId) {
        let _gate = self.gate.lock().await;
        let scopes = self.registry.close(document).await;
        for scope in &scopes {
            self.host.markers.erase_markers(document, &marker_key(scope));
        }
        log::debug!("Document {} closed, URL state cleared", document);
    }

    // Event scans never fail the host; a bad pattern keeps the old highlights.
    async fn rescan_for_event(&self, document: DocumentId, event: &str) {
        if let Err(e) = self.update_url_highlights(document, false).await {
            log::warn!(
                "URL scan on {} for document {} failed: {:#}",
                event,
                document,
                e
            );
        }
    }

    /// Runs a command against a document and returns a status line for the host.
    pub async fn run_command(
        &self,
        document: DocumentId,
        command: UrlCommand,
    ) -> Result<Option<String>> {
        match command {
            UrlCommand::FindUrls => {
                let status = match self.update_url_highlights(document, true).await? {
                    ScanOutcome::Scanned { urls, .. } => format!("Found {} URLs", urls),
                    ScanOutcome::LimitExceeded { found, limit } => format!(
                        "Too many URLs ({} > {}), ignoring this document",
                        found, limit
                    ),
                    ScanOutcome::Ignored => "URLs are ignored in this document".to_string(),
                    ScanOutcome::Missing | ScanOutcome::Disabled => return Ok(None),
                };
                Ok(Some(status))
            }
            UrlCommand::OpenUrlUnderCursor => match self.url_under_cursor(document).await {
                Some(url) => {
                    self.open_url(&url).await?;
                    Ok(Some(format!("Opening {}", url)))
                }
                None => Ok(None),
            },
            UrlCommand::OpenAllUrls => {
                let opened = self.open_all_urls(document).await;
                if opened == 0 {
                    log::debug!("No URLs to open in document {}", document);
                    Ok(None)
                } else {
                    Ok(Some(format!("Opened {} URLs", opened)))
                }
            }
        }
    }

    /// Text-command entry point, e.g. from a `:` command line.
    pub async fn on_command(&self, document: DocumentId, command: &str) -> Result<Option<String>> {
        match command.parse::<UrlCommand>() {
            Ok(command) => self.run_command(document, command).await,
            Err(_) => Ok(None),
        }
    }
}
