use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Range;
use tokio::sync::RwLock;
use urlcore::{scopes_to_remove, UrlSpan};

/// Identifies an open document for as long as it stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stored match: byte range plus the scope label at its start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlRegion {
    pub start: usize,
    pub end: usize,
    pub scope: String,
}

impl UrlRegion {
    pub fn new(span: UrlSpan, scope: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            scope: scope.into(),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Cursor hit test. Both ends are inclusive so a cursor resting just
    /// after the last character still counts as on the URL.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Unscanned,
    Scanned,
    Ignored,
}

/// Per-document URL index: stored matches, underlined scopes and the
/// ignore set. Writers must hold the scan gate.
#[derive(Debug, Default)]
pub struct UrlRegistry {
    urls: RwLock<HashMap<DocumentId, Vec<UrlRegion>>>,
    scopes: RwLock<HashMap<DocumentId, BTreeSet<String>>>,
    ignored: RwLock<HashSet<DocumentId>>,
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self, document: DocumentId) -> ScanState {
        if self.ignored.read().await.contains(&document) {
            ScanState::Ignored
        } else if self.urls.read().await.contains_key(&document) {
            ScanState::Scanned
        } else {
            ScanState::Unscanned
        }
    }

    pub async fn is_ignored(&self, document: DocumentId) -> bool {
        self.ignored.read().await.contains(&document)
    }

    /// Stored matches, or `None` when the document has never been stored.
    pub async fn urls(&self, document: DocumentId) -> Option<Vec<UrlRegion>> {
        self.urls.read().await.get(&document).cloned()
    }

    pub async fn scopes(&self, document: DocumentId) -> BTreeSet<String> {
        self.scopes
            .read()
            .await
            .get(&document)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) async fn store_urls(&self, document: DocumentId, urls: Vec<UrlRegion>) {
        self.urls.write().await.insert(document, urls);
    }

    /// Moves the document into the ignore set and drops its matches.
    /// Returns the scopes that were underlined so the caller can erase them.
    pub(crate) async fn ignore(&self, document: DocumentId) -> BTreeSet<String> {
        self.ignored.write().await.insert(document);
        self.urls.write().await.remove(&document);
        self.scopes
            .write()
            .await
            .remove(&document)
            .unwrap_or_default()
    }

    /// Replaces the underlined scopes and returns the ones no longer used.
    pub(crate) async fn replace_scopes(
        &self,
        document: DocumentId,
        new_scopes: BTreeSet<String>,
    ) -> BTreeSet<String> {
        let mut scopes = self.scopes.write().await;
        let removed = match scopes.get(&document) {
            Some(old_scopes) => scopes_to_remove(old_scopes, &new_scopes),
            None => BTreeSet::new(),
        };
        scopes.insert(document, new_scopes);
        removed
    }

    /// Drops every entry for the document and returns the scopes that were
    /// still underlined.
    pub(crate) async fn close(&self, document: DocumentId) -> BTreeSet<String> {
        self.urls.write().await.remove(&document);
        self.ignored.write().await.remove(&document);
        self.scopes
            .write()
            .await
            .remove(&document)
            .unwrap_or_default()
    }

    pub async fn document_count(&self) -> usize {
        self.urls.read().await.len()
    }
}
