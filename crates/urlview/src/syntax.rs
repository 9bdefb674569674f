use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};

/// Scope labels of a text, as change points sorted by byte offset.
#[derive(Debug, Clone, Default)]
pub struct ScopeMap {
    points: Vec<(usize, String)>,
}

impl ScopeMap {
    /// Space-joined scope stack in effect at `offset`.
    pub fn scope_at(&self, offset: usize) -> &str {
        let idx = self.points.partition_point(|(start, _)| *start <= offset);
        if idx == 0 {
            ""
        } else {
            &self.points[idx - 1].1
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn record(&mut self, offset: usize, stack: &ScopeStack) {
        let label = stack
            .as_slice()
            .iter()
            .map(|scope| scope.build_string())
            .collect::<Vec<_>>()
            .join(" ");

        match self.points.last_mut() {
            Some((last, existing)) if *last == offset => *existing = label,
            _ => self.points.push((offset, label)),
        }
    }
}

pub struct ScopeResolver {
    syntax_set: SyntaxSet,
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    pub fn find_syntax_for_filename<'a>(&'a self, filename: &str) -> &'a SyntaxReference {
        let lower = filename.to_lowercase();
        if lower.ends_with(".md") || lower.ends_with(".markdown") {
            if let Some(md) = self.syntax_set.find_syntax_by_name("Markdown") {
                return md;
            }
        }
        let ext = filename.rsplit('.').next().unwrap_or("");
        self.syntax_set
            .find_syntax_by_extension(ext)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Parses the whole text once. Lines that fail to parse keep the scope
    /// stack from before the failure.
    pub fn scope_map(&self, text: &str, syntax: &SyntaxReference) -> ScopeMap {
        let mut map = ScopeMap::default();
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut line_start = 0;

        for line in text.split_inclusive('\n') {
            match state.parse_line(line, &self.syntax_set) {
                Ok(ops) => {
                    for (idx, op) in ops {
                        if let Err(e) = stack.apply(&op) {
                            log::debug!("Scope stack error at {}: {:?}", line_start + idx, e);
                            continue;
                        }
                        map.record(line_start + idx, &stack);
                    }
                }
                Err(e) => {
                    log::warn!("Syntax parsing failed at byte {}: {}", line_start, e);
                }
            }
            line_start += line.len();
        }

        map
    }
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}
