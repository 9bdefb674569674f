//! In-memory host used by the unit tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::host::{BrowserLauncher, DocumentSource, HostBindings, MarkerRenderer, Workspace};
use crate::registry::{DocumentId, UrlRegion};
use crate::settings::{SettingsSource, UrlSettings};
use crate::ClickableUrls;

const DEFAULT_SCOPE: &str = "text.plain";

/// `count` distinct URLs separated by spaces.
pub(crate) fn numbered_urls(count: usize) -> String {
    (0..count)
        .map(|i| format!("http://example.com/{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct FakeDocument {
    text: String,
    selection: Range<usize>,
    /// Scope label from each offset onwards until the next entry.
    scopes: BTreeMap<usize, String>,
}

#[derive(Default)]
pub(crate) struct FakeHost {
    documents: Mutex<HashMap<DocumentId, FakeDocument>>,
    markers: Mutex<HashMap<DocumentId, BTreeMap<String, Vec<Range<usize>>>>>,
    erased: Mutex<HashMap<DocumentId, Vec<String>>>,
    settings: Mutex<UrlSettings>,
    opened_urls: Mutex<Vec<(String, Option<String>)>>,
    opened_files: Mutex<Vec<PathBuf>>,
    errors: Mutex<Vec<String>>,
    browser_fails: AtomicBool,
    next_id: AtomicU64,
}

impl FakeHost {
    pub(crate) fn new(settings: UrlSettings) -> Arc<Self> {
        Arc::new(Self {
            settings: Mutex::new(settings),
            ..Self::default()
        })
    }

    pub(crate) fn plugin(settings: UrlSettings) -> (Arc<Self>, ClickableUrls) {
        let host = Self::new(settings);
        let plugin = ClickableUrls::new(host.bindings(), host.clone());
        (host, plugin)
    }

    pub(crate) fn bindings(self: &Arc<Self>) -> HostBindings {
        HostBindings::from_host(self.clone(), self.clone())
    }

    pub(crate) fn open(&self, text: &str) -> DocumentId {
        let id = DocumentId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let document = FakeDocument {
            text: text.to_string(),
            ..FakeDocument::default()
        };
        self.documents.lock().unwrap().insert(id, document);
        id
    }

    pub(crate) fn set_text(&self, document: DocumentId, text: &str) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.text = text.to_string();
        }
    }

    pub(crate) fn set_selection(&self, document: DocumentId, selection: Range<usize>) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.selection = selection;
        }
    }

    pub(crate) fn set_scope_after(&self, document: DocumentId, offset: usize, scope: &str) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.scopes.insert(offset, scope.to_string());
        }
    }

    pub(crate) fn clear_scopes(&self, document: DocumentId) {
        if let Some(doc) = self.documents.lock().unwrap().get_mut(&document) {
            doc.scopes.clear();
        }
    }

    pub(crate) fn set_settings(&self, settings: UrlSettings) {
        *self.settings.lock().unwrap() = settings;
    }

    pub(crate) fn fail_browser(&self, fail: bool) {
        self.browser_fails.store(fail, Ordering::SeqCst);
    }

    /// Keys of the marker groups currently drawn, sorted.
    pub(crate) fn marker_keys(&self, document: DocumentId) -> Vec<String> {
        self.markers
            .lock()
            .unwrap()
            .get(&document)
            .map(|groups| groups.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn marker_ranges(&self, document: DocumentId, key: &str) -> Vec<Range<usize>> {
        self.markers
            .lock()
            .unwrap()
            .get(&document)
            .and_then(|groups| groups.get(key).cloned())
            .unwrap_or_default()
    }

    pub(crate) fn erased(&self, document: DocumentId) -> Vec<String> {
        self.erased
            .lock()
            .unwrap()
            .get(&document)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn opened_urls(&self) -> Vec<(String, Option<String>)> {
        self.opened_urls.lock().unwrap().clone()
    }

    pub(crate) fn opened_files(&self) -> Vec<PathBuf> {
        self.opened_files.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl DocumentSource for FakeHost {
    fn full_text(&self, document: DocumentId) -> Option<String> {
        self.documents
            .lock()
            .unwrap()
            .get(&document)
            .map(|doc| doc.text.clone())
    }

    fn scope_name(&self, document: DocumentId, offset: usize) -> String {
        self.documents
            .lock()
            .unwrap()
            .get(&document)
            .and_then(|doc| doc.scopes.range(..=offset).next_back().map(|(_, s)| s.clone()))
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string())
    }

    fn selection(&self, document: DocumentId) -> Option<Range<usize>> {
        self.documents
            .lock()
            .unwrap()
            .get(&document)
            .map(|doc| doc.selection.clone())
    }
}

impl MarkerRenderer for FakeHost {
    fn add_markers(&self, document: DocumentId, key: &str, regions: &[UrlRegion], _scope: &str) {
        let ranges = regions.iter().map(UrlRegion::range).collect();
        self.markers
            .lock()
            .unwrap()
            .entry(document)
            .or_default()
            .insert(key.to_string(), ranges);
    }

    fn erase_markers(&self, document: DocumentId, key: &str) {
        if let Some(groups) = self.markers.lock().unwrap().get_mut(&document) {
            groups.remove(key);
        }
        self.erased
            .lock()
            .unwrap()
            .entry(document)
            .or_default()
            .push(key.to_string());
    }
}

impl BrowserLauncher for FakeHost {
    fn open_url(&self, url: &str, browser: Option<&str>) -> Result<()> {
        if self.browser_fails.load(Ordering::SeqCst) {
            anyhow::bail!("no runnable browser");
        }
        self.opened_urls
            .lock()
            .unwrap()
            .push((url.to_string(), browser.map(str::to_string)));
        Ok(())
    }
}

impl Workspace for FakeHost {
    fn open_file(&self, path: &Path) {
        self.opened_files.lock().unwrap().push(path.to_path_buf());
    }

    fn error_message(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[async_trait]
impl SettingsSource for FakeHost {
    async fn load(&self) -> Result<UrlSettings> {
        Ok(self.settings.lock().unwrap().clone())
    }
}
