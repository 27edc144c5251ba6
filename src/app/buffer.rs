use super::main_view::Commit;

/// Styling tag of a line, derived from the text it starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineType {
    DiffHeader,
    DiffChunk,
    DiffAdd,
    DiffDel,
    DiffIndex,
    DiffOldFile,
    DiffNewFile,
    DiffMode,
    DiffCopy,
    DiffRename,
    DiffSimilarity,
    DiffStat,
    DiffTree,
    PpAuthor,
    PpCommit,
    PpMerge,
    PpDate,
    Commit,
    Parent,
    Tree,
    Author,
    Committer,
    Signoff,
    Default,
    /// A main view commit summary
    MainCommit,
}

/// Prefix table; first match wins, so longer prefixes come first.
const LINE_PREFIXES: &[(&str, LineType)] = &[
    ("diff --git ", LineType::DiffHeader),
    ("diff-tree ", LineType::DiffTree),
    ("@@", LineType::DiffChunk),
    ("--- ", LineType::DiffOldFile),
    ("+++ ", LineType::DiffNewFile),
    ("+", LineType::DiffAdd),
    ("-", LineType::DiffDel),
    ("index ", LineType::DiffIndex),
    ("old mode ", LineType::DiffMode),
    ("new mode ", LineType::DiffMode),
    ("new file mode ", LineType::DiffMode),
    ("deleted file mode ", LineType::DiffMode),
    ("copy from ", LineType::DiffCopy),
    ("copy to ", LineType::DiffCopy),
    ("rename from ", LineType::DiffRename),
    ("rename to ", LineType::DiffRename),
    ("similarity ", LineType::DiffSimilarity),
    ("dissimilarity ", LineType::DiffSimilarity),
    ("commit ", LineType::Commit),
    ("Author: ", LineType::PpAuthor),
    ("Commit: ", LineType::PpCommit),
    ("Merge: ", LineType::PpMerge),
    ("Date:", LineType::PpDate),
    ("AuthorDate: ", LineType::PpDate),
    ("CommitDate: ", LineType::PpDate),
    ("parent ", LineType::Parent),
    ("tree ", LineType::Tree),
    ("author ", LineType::Author),
    ("committer ", LineType::Committer),
    ("    Signed-off-by", LineType::Signoff),
];

impl LineType {
    /// Classify a raw pager line.
    pub fn classify(text: &str) -> LineType {
        if let Some(&(_, kind)) = LINE_PREFIXES.iter().find(|(p, _)| text.starts_with(p)) {
            return kind;
        }
        if is_diffstat(text) {
            return LineType::DiffStat;
        }
        LineType::Default
    }
}

/// ` path | 12 ++--` or ` 3 files changed, 10 insertions(+)`
fn is_diffstat(text: &str) -> bool {
    if !text.starts_with(' ') || text.starts_with("    ") {
        return false;
    }
    text.contains(" | ") || (text.contains(" changed") && text.contains("file"))
}

/// Kind-specific content of a line
#[derive(Debug, Clone, PartialEq)]
pub enum LineData {
    Text(String),
    Commit(Commit),
}

/// One renderable unit of a view
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub kind: LineType,
    pub data: LineData,
}

impl Line {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Line {
            kind: LineType::classify(&text),
            data: LineData::Text(text),
        }
    }

    pub fn commit(commit: Commit) -> Self {
        Line {
            kind: LineType::MainCommit,
            data: LineData::Commit(commit),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            LineData::Text(t) => Some(t),
            LineData::Commit(_) => None,
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match &self.data {
            LineData::Commit(c) => Some(c),
            LineData::Text(_) => None,
        }
    }
}

/// Append-only line storage of a view. Sealed once its stream ends.
#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Vec<Line>,
    sealed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) {
        debug_assert!(!self.sealed, "append to a sealed line buffer");
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn last(&self) -> Option<&Line> {
        self.lines.last()
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    #[allow(dead_code)]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Drop all lines and reopen for appending.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.sealed = false;
    }
}
