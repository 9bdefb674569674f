use anyhow::{Context, Result};
use clickable_urls::{DocumentId, DocumentSource, MarkerRenderer, UrlRegion, Workspace};
use crossterm::style::Stylize;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crate::document::Buffer;
use crate::syntax::ScopeResolver;

#[derive(Debug, Clone)]
struct MarkerGroup {
    ranges: Vec<Range<usize>>,
    scope: String,
}

/// Host for files on disk, rendering URL markers as terminal underlines.
pub struct TerminalHost {
    buffers: RwLock<HashMap<DocumentId, Buffer>>,
    markers: Mutex<HashMap<DocumentId, BTreeMap<String, MarkerGroup>>>,
    opened_files: Mutex<Vec<PathBuf>>,
    errors: Mutex<Vec<String>>,
    resolver: ScopeResolver,
    next_id: AtomicU64,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            markers: Mutex::new(HashMap::new()),
            opened_files: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            resolver: ScopeResolver::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn open_path(&self, path: &Path) -> Result<DocumentId> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        if content.contains('\0') {
            return Err(anyhow::anyhow!(
                "File looks like binary data: {}",
                path.display()
            ));
        }
        Ok(self.open_text(path.to_path_buf(), &content))
    }

    pub fn open_text(&self, path: PathBuf, content: &str) -> DocumentId {
        let id = DocumentId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let scopes = self.scope_map_for(&path, content);
        let buffer = Buffer::new(id, path, content, scopes);
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.insert(id, buffer);
        }
        log::debug!("Opened buffer {}", id);
        id
    }

    pub fn close(&self, document: DocumentId) {
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.remove(&document);
        }
        if let Ok(mut markers) = self.markers.lock() {
            markers.remove(&document);
        }
    }

    /// Runs `f` against the buffer, if it is open.
    pub fn with_buffer<T>(&self, document: DocumentId, f: impl FnOnce(&Buffer) -> T) -> Option<T> {
        let buffers = self.buffers.read().ok()?;
        buffers.get(&document).map(f)
    }

    pub fn with_buffer_mut<T>(
        &self,
        document: DocumentId,
        f: impl FnOnce(&mut Buffer) -> T,
    ) -> Option<T> {
        let mut buffers = self.buffers.write().ok()?;
        buffers.get_mut(&document).map(f)
    }

    pub fn marker_ranges(&self, document: DocumentId) -> Vec<(String, Range<usize>)> {
        let markers = match self.markers.lock() {
            Ok(markers) => markers,
            Err(_) => return Vec::new(),
        };
        let mut ranges: Vec<(String, Range<usize>)> = markers
            .get(&document)
            .map(|groups| {
                groups
                    .values()
                    .flat_map(|group| {
                        group
                            .ranges
                            .iter()
                            .map(move |range| (group.scope.clone(), range.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        ranges.sort_by_key(|(_, range)| range.start);
        ranges
    }

    /// The buffer text with every marker range underlined.
    pub fn render(&self, document: DocumentId) -> Option<String> {
        let text = self.with_buffer(document, Buffer::text)?;
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        for (_, range) in self.marker_ranges(document) {
            if range.start < pos || range.end > text.len() {
                continue;
            }
            out.push_str(&text[pos..range.start]);
            out.push_str(&text[range.clone()].underlined().to_string());
            pos = range.end;
        }
        out.push_str(&text[pos..]);
        Some(out)
    }

    pub fn opened_files(&self) -> Vec<PathBuf> {
        self.opened_files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }

    fn scope_map_for(&self, path: &Path, content: &str) -> crate::syntax::ScopeMap {
        let filename = path.to_string_lossy();
        let syntax = self.resolver.find_syntax_for_filename(&filename);
        self.resolver.scope_map(content, syntax)
    }
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource for TerminalHost {
    fn full_text(&self, document: DocumentId) -> Option<String> {
        self.with_buffer(document, Buffer::text)
    }

    fn scope_name(&self, document: DocumentId, offset: usize) -> String {
        self.with_buffer(document, |buffer| buffer.scopes.scope_at(offset).to_string())
            .unwrap_or_default()
    }

    fn selection(&self, document: DocumentId) -> Option<Range<usize>> {
        self.with_buffer(document, |buffer| buffer.selection.clone())
    }

    fn substr(&self, document: DocumentId, range: Range<usize>) -> Option<String> {
        self.with_buffer(document, |buffer| {
            let len = buffer.content.len_bytes();
            if range.start > range.end || range.end > len {
                return None;
            }
            let start = buffer.content.byte_to_char(range.start);
            let end = buffer.content.byte_to_char(range.end);
            Some(buffer.content.slice(start..end).to_string())
        })
        .flatten()
    }
}

impl MarkerRenderer for TerminalHost {
    fn add_markers(&self, document: DocumentId, key: &str, regions: &[UrlRegion], scope: &str) {
        if let Ok(mut markers) = self.markers.lock() {
            let group = MarkerGroup {
                ranges: regions.iter().map(UrlRegion::range).collect(),
                scope: scope.to_string(),
            };
            markers
                .entry(document)
                .or_default()
                .insert(key.to_string(), group);
        }
    }

    fn erase_markers(&self, document: DocumentId, key: &str) {
        if let Ok(mut markers) = self.markers.lock() {
            if let Some(groups) = markers.get_mut(&document) {
                groups.remove(key);
            }
        }
    }
}

impl Workspace for TerminalHost {
    fn open_file(&self, path: &Path) {
        log::info!("Opening file as document: {}", path.display());
        if let Ok(mut files) = self.opened_files.lock() {
            files.push(path.to_path_buf());
        }
    }

    fn error_message(&self, message: &str) {
        log::error!("{}", message);
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickable_urls::{ClickableUrls, HostBindings, SystemBrowser, UrlSettings};
    use std::sync::Arc;

    fn plugin(host: &Arc<TerminalHost>) -> ClickableUrls {
        let bindings = HostBindings::from_host(host.clone(), Arc::new(SystemBrowser));
        ClickableUrls::new(bindings, Arc::new(UrlSettings::default()))
    }

    #[tokio::test]
    async fn test_scan_underlines_urls_with_text_scope() {
        let host = Arc::new(TerminalHost::new());
        let doc = host.open_text(PathBuf::from("notes.txt"), "a http://a.io b\n");
        let plugin = plugin(&host);

        plugin.on_load(doc).await;

        assert_eq!(
            host.marker_ranges(doc),
            vec![("text.plain".to_string(), 2..13)]
        );
        let rendered = host.render(doc).unwrap();
        assert!(rendered.starts_with("a "));
        assert!(rendered.contains(&"http://a.io".underlined().to_string()));
        assert!(rendered.ends_with(" b\n"));
    }

    #[tokio::test]
    async fn test_cursor_lookup_through_buffer_selection() {
        let host = Arc::new(TerminalHost::new());
        let doc = host.open_text(PathBuf::from("notes.txt"), "line one\nsee https://docs.rs\n");
        let plugin = plugin(&host);
        plugin.on_load(doc).await;

        let offset = host.with_buffer(doc, |buf| buf.parse_position("2:8")).flatten().unwrap();
        host.with_buffer_mut(doc, |buf| buf.set_cursor(offset));

        assert_eq!(
            plugin.url_under_cursor(doc).await.as_deref(),
            Some("https://docs.rs")
        );
    }

    #[tokio::test]
    async fn test_open_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "http://a.io\n").unwrap();

        let host = TerminalHost::new();
        let doc = host.open_path(&path).await.unwrap();
        assert_eq!(host.full_text(doc).as_deref(), Some("http://a.io\n"));
        assert!(host.open_path(&dir.path().join("missing.txt")).await.is_err());
    }

    #[tokio::test]
    async fn test_substr_rejects_bad_ranges() {
        let host = TerminalHost::new();
        let doc = host.open_text(PathBuf::from("a.txt"), "日本 http://a.io");

        assert_eq!(host.substr(doc, 7..18).as_deref(), Some("http://a.io"));
        assert_eq!(host.substr(doc, 7..99), None);
    }

    #[test]
    fn test_erase_and_close_drop_markers() {
        let host = TerminalHost::new();
        let doc = host.open_text(PathBuf::from("a.txt"), "http://a.io");
        let region = UrlRegion {
            start: 0,
            end: 11,
            scope: "text.plain".to_string(),
        };

        host.add_markers(doc, "k", &[region.clone()], "text.plain");
        assert_eq!(host.marker_ranges(doc).len(), 1);
        host.erase_markers(doc, "k");
        assert!(host.marker_ranges(doc).is_empty());

        host.add_markers(doc, "k", &[region], "text.plain");
        host.close(doc);
        assert!(host.marker_ranges(doc).is_empty());
        assert_eq!(host.full_text(doc), None);
    }

    #[test]
    fn test_workspace_records_requests() {
        let host = TerminalHost::new();
        host.open_file(Path::new("/tmp/notes.txt"));
        host.error_message("boom");

        assert_eq!(host.opened_files(), vec![PathBuf::from("/tmp/notes.txt")]);
        assert_eq!(host.errors(), vec!["boom".to_string()]);
    }
}
