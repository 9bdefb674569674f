use anyhow::Result;
use std::collections::BTreeSet;
use urlcore::{group_by_scope, marker_key, UrlMatcher};

use crate::registry::{DocumentId, UrlRegion};
use crate::ClickableUrls;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// `auto_find_urls` is off and the scan was not forced.
    Disabled,
    /// The document is in the ignore set.
    Ignored,
    /// The host no longer knows the document.
    Missing,
    /// Too many matches; the document has just been ignored.
    LimitExceeded { found: usize, limit: usize },
    Scanned { urls: usize, highlighted: bool },
}

impl ClickableUrls {
    /// Finds all URLs in the document, stores them and underlines them.
    /// `force` bypasses the `auto_find_urls` setting.
    ///
    /// Runs entirely under the scan gate. On error the previously stored
    /// matches and markers are left as they were.
    pub async fn update_url_highlights(
        &self,
        document: DocumentId,
        force: bool,
    ) -> Result<ScanOutcome> {
        let _gate = self.gate.lock().await;

        let settings = self.settings.load().await?;
        if !force && !settings.auto_find_urls {
            return Ok(ScanOutcome::Disabled);
        }

        if self.registry.is_ignored(document).await {
            return Ok(ScanOutcome::Ignored);
        }

        let text = match self.host.documents.full_text(document) {
            Some(text) => text,
            None => {
                log::debug!("Document {} is not open, skipping URL scan", document);
                return Ok(ScanOutcome::Missing);
            }
        };

        let matcher = UrlMatcher::new(settings.supplementary_pattern())?;
        let spans = matcher.find_all(&text);

        // Avoid slowdowns for documents with too many URLs
        if spans.len() > settings.max_url_limit {
            log::info!(
                "Ignoring document {} with {} URLs (limit {})",
                document,
                spans.len(),
                settings.max_url_limit
            );
            let stale_scopes = self.registry.ignore(document).await;
            for scope in &stale_scopes {
                self.host.markers.erase_markers(document, &marker_key(scope));
            }
            return Ok(ScanOutcome::LimitExceeded {
                found: spans.len(),
                limit: settings.max_url_limit,
            });
        }

        let urls: Vec<UrlRegion> = spans
            .into_iter()
            .map(|span| {
                let scope = self.host.documents.scope_name(document, span.start);
                UrlRegion::new(span, scope)
            })
            .collect();
        let count = urls.len();

        self.registry.store_urls(document, urls.clone()).await;

        if settings.highlight_urls {
            self.highlight_urls(document, &urls).await;
        }

        log::debug!("Found {} URLs in document {}", count, document);
        Ok(ScanOutcome::Scanned {
            urls: count,
            highlighted: settings.highlight_urls,
        })
    }

    /// One marker group per scope, since the host styles a group with a
    /// single scope.
    async fn highlight_urls(&self, document: DocumentId, urls: &[UrlRegion]) {
        let groups = group_by_scope(urls.iter().cloned(), |url| url.scope.as_str());
        let new_scopes: BTreeSet<String> = groups.keys().cloned().collect();

        let unused = self.registry.replace_scopes(document, new_scopes).await;
        for scope in &unused {
            self.host.markers.erase_markers(document, &marker_key(scope));
        }

        for (scope, regions) in &groups {
            self.host
                .markers
                .add_markers(document, &marker_key(scope), regions, scope);
        }
    }
}
