use super::buffer::{Line, LineBuffer};
use super::loader::{LoadError, LoadStatus, Loader};
use super::main_view::MainOps;
use super::pager::PagerOps;
use super::request::Request;
use crate::git::{RefStore, Stream};
use std::time::Duration;

/// Loading longer than this shows elapsed seconds in the title.
const SHOW_ELAPSED_AFTER: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Main,
    Diff,
    Log,
    Help,
    Pager,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Main,
        ViewKind::Diff,
        ViewKind::Log,
        ViewKind::Help,
        ViewKind::Pager,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Main => "main",
            ViewKind::Diff => "diff",
            ViewKind::Log => "log",
            ViewKind::Help => "help",
            ViewKind::Pager => "pager",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    fn ops(self) -> Box<dyn ViewOps> {
        match self {
            ViewKind::Main => Box::new(MainOps::new()),
            ViewKind::Diff | ViewKind::Log | ViewKind::Help | ViewKind::Pager => {
                Box::new(PagerOps::new())
            }
        }
    }
}

/// How a view is brought on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    /// Show below the opener instead of replacing the display
    pub split: bool,
    /// Keep focus where it is
    pub backgrounded: bool,
    /// Re-run the command even if the loaded reference still matches
    pub reload: bool,
}

impl OpenFlags {
    pub const DEFAULT: OpenFlags = OpenFlags {
        split: false,
        backgrounded: false,
        reload: false,
    };
    pub const SPLIT: OpenFlags = OpenFlags {
        split: true,
        ..OpenFlags::DEFAULT
    };

    pub const fn backgrounded(self) -> Self {
        OpenFlags {
            backgrounded: true,
            ..self
        }
    }

    pub const fn reload(self) -> Self {
        OpenFlags {
            reload: true,
            ..self
        }
    }
}

/// Per-line drawing parameters
#[derive(Debug, Clone, Copy)]
pub struct DrawContext {
    pub width: usize,
    /// Index of the line in its buffer
    pub lineno: usize,
    /// The line is under the cursor
    pub selected: bool,
    pub utf8: bool,
    pub tab_size: usize,
    /// Number every Nth line; 0 disables
    pub line_number: usize,
}

/// A rendered row plus the reference it exposes when under the cursor
#[derive(Debug, Default)]
pub struct DrawnLine {
    pub line: ratatui::text::Line<'static>,
    pub captured_ref: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct EnterContext {
    pub kind: ViewKind,
    /// The view is the only one displayed
    pub fullscreen: bool,
}

/// What Enter on a line asks the dispatcher to do
#[derive(Debug, Default, PartialEq)]
pub struct EnterAction {
    /// Open the diff view for this commit id
    pub open_diff: Option<(String, OpenFlags)>,
    /// Advance the cursor one line afterwards
    pub walk: bool,
}

/// Behaviour that differs between view kinds.
pub trait ViewOps: std::fmt::Debug {
    /// Noun used in the title bar position ("line", "commit")
    fn item_label(&self) -> &'static str;

    /// Consume one line of command output.
    fn read(&mut self, buffer: &mut LineBuffer, refs: &RefStore, text: String);

    /// The stream ended; flush any partially parsed record.
    fn finish(&mut self, _buffer: &mut LineBuffer, _refs: &RefStore) {}

    /// Forget parser state before a reload.
    fn reset(&mut self) {}

    fn draw(&self, line: &Line, ctx: &DrawContext) -> DrawnLine;

    fn enter(&self, line: &Line, ctx: &EnterContext) -> EnterAction;

    /// Commit id exposed by `line` when it is under the cursor.
    fn selected_ref(&self, line: &Line) -> Option<String>;
}

/// One named panel backed by a command's output.
#[derive(Debug)]
pub struct View {
    pub kind: ViewKind,
    /// Reference shown in the title, follows the cursor
    pub reference: String,
    /// Reference the buffer was loaded for; `None` if never loaded or
    /// the load was cut short
    pub loaded_ref: Option<String>,
    pub lines: LineBuffer,
    pub cursor: usize,
    pub offset: usize,
    pub width: usize,
    pub height: usize,
    /// View this one was opened from
    pub parent: Option<ViewKind>,
    loader: Option<Loader>,
    ops: Box<dyn ViewOps>,
}

impl View {
    pub fn new(kind: ViewKind) -> Self {
        View {
            kind,
            reference: String::new(),
            loaded_ref: None,
            lines: LineBuffer::new(),
            cursor: 0,
            offset: 0,
            width: 0,
            height: 1,
            parent: None,
            loader: None,
            ops: kind.ops(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// Throw away the current content and start reading `stream`.
    pub fn begin_update(&mut self, stream: Stream, reference: &str) {
        // Replacing the loader kills any command still running.
        self.loader = None;
        self.lines.reset();
        self.ops.reset();
        self.cursor = 0;
        self.offset = 0;
        self.reference = reference.to_string();
        self.loaded_ref = Some(reference.to_string());
        self.loader = Some(Loader::start(stream));
        tracing::debug!(target: "view", view = self.kind.name(), reference, "load_started");
    }

    fn end_update(&mut self, refs: &RefStore) {
        self.ops.finish(&mut self.lines, refs);
        self.lines.seal();
        if let Some(loader) = self.loader.take() {
            tracing::debug!(
                target: "view",
                view = self.kind.name(),
                lines = self.lines.len(),
                elapsed_ms = loader.elapsed().as_millis() as u64,
                "load_finished"
            );
        }
    }

    /// Terminate a running load. Lines read so far stay, but the view will
    /// reload the next time it is opened.
    pub fn stop_loading(&mut self) {
        if let Some(loader) = self.loader.take() {
            tracing::info!(target: "view", view = self.kind.name(), lines = self.lines.len(), "load_terminated");
            drop(loader);
            self.lines.seal();
            self.loaded_ref = None;
        }
    }

    /// Move up to `max_lines` ready lines into the buffer. Returns whether
    /// the buffer grew.
    pub fn update(&mut self, refs: &RefStore, max_lines: usize) -> Result<bool, LoadError> {
        let Some(loader) = self.loader.as_mut() else {
            return Ok(false);
        };
        let batch = loader.poll(max_lines);
        let before = self.lines.len();
        for text in batch.lines {
            self.ops.read(&mut self.lines, refs, text);
        }

        match batch.status {
            LoadStatus::Pending => {}
            LoadStatus::Done => self.end_update(refs),
            LoadStatus::Failed(err) => {
                self.end_update(refs);
                return Err(LoadError::Read(err));
            }
        }
        Ok(self.lines.len() != before)
    }

    // ── Geometry ──

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height.max(1);
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// Apply a cursor movement request.
    pub fn move_cursor(&mut self, request: Request) -> Result<(), &'static str> {
        let lines = self.lines.len() as isize;
        let cursor = self.cursor as isize;
        let height = self.height as isize;
        let steps = match request {
            Request::MoveUp | Request::Previous => -1,
            Request::MoveDown | Request::Next => 1,
            Request::MovePageUp => -height,
            Request::MovePageDown => height,
            Request::MoveFirstLine => -cursor,
            Request::MoveLastLine => lines - 1 - cursor,
            _ => return Ok(()),
        };

        if steps <= 0 && cursor == 0 {
            return Err("Cannot move beyond first line");
        }
        if steps >= 0 && cursor + 1 >= lines {
            return Err("Cannot move beyond last line");
        }

        if matches!(request, Request::MovePageUp | Request::MovePageDown) {
            let offset = (self.offset as isize + steps).clamp(0, self.max_offset() as isize);
            self.offset = offset as usize;
        }
        self.cursor = (cursor + steps).clamp(0, lines - 1) as usize;
        self.ensure_cursor_visible();
        Ok(())
    }

    /// Scroll the view by one line, dragging the cursor along if it would
    /// leave the screen.
    pub fn scroll(&mut self, request: Request) -> Result<(), &'static str> {
        match request {
            Request::ScrollLineDown => {
                if self.offset + self.height >= self.lines.len() {
                    return Err("Cannot scroll beyond the last line");
                }
                self.offset += 1;
                if self.cursor < self.offset {
                    self.cursor = self.offset;
                }
            }
            Request::ScrollLineUp => {
                if self.offset == 0 {
                    return Err("Cannot scroll beyond the first line");
                }
                self.offset -= 1;
                if self.cursor >= self.offset + self.height {
                    self.cursor = self.offset + self.height - 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Advance the cursor one line, scrolling with it so the cursor keeps
    /// its screen row while there is more to show.
    pub fn walk_down(&mut self) -> Result<(), &'static str> {
        if self.cursor + 1 >= self.lines.len() {
            return Err("Cannot move beyond last line");
        }
        self.cursor += 1;
        if self.offset + self.height < self.lines.len() {
            self.offset += 1;
        }
        self.ensure_cursor_visible();
        Ok(())
    }

    // ── Content ──

    /// Update the title reference from the cursor line.
    pub fn capture_ref(&mut self) -> Option<String> {
        let id = self
            .lines
            .get(self.cursor)
            .and_then(|line| self.ops.selected_ref(line))?;
        self.reference.clone_from(&id);
        Some(id)
    }

    pub fn draw_line(&self, index: usize, ctx: &DrawContext) -> Option<DrawnLine> {
        self.lines.get(index).map(|line| self.ops.draw(line, ctx))
    }

    pub fn enter(&self, fullscreen: bool) -> EnterAction {
        let ctx = EnterContext {
            kind: self.kind,
            fullscreen,
        };
        self.lines
            .get(self.cursor)
            .map(|line| self.ops.enter(line, &ctx))
            .unwrap_or_default()
    }

    pub fn title(&self) -> String {
        let mut title = if self.reference.is_empty() {
            format!("[{}]", self.kind.name())
        } else {
            format!("[{}] {}", self.kind.name(), self.reference)
        };

        let lines = self.lines.len();
        if lines > 0 || self.is_loading() {
            let percent = if lines > 0 {
                (self.cursor + 1) * 100 / lines
            } else {
                0
            };
            title.push_str(&format!(
                " - {} {} of {} ({}%)",
                self.ops.item_label(),
                self.cursor + 1,
                lines,
                percent
            ));
        }

        if let Some(loader) = &self.loader {
            let elapsed = loader.elapsed();
            if elapsed > SHOW_ELAPSED_AFTER {
                title.push_str(&format!(" {}s", elapsed.as_secs()));
            }
        }
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn make_view(kind: ViewKind, lines: usize, height: usize) -> View {
        let mut view = View::new(kind);
        for i in 0..lines {
            view.lines.push(Line::text(format!("line {}", i)));
        }
        view.set_size(80, height);
        view
    }

    fn load_text(view: &mut View, text: &str) {
        let refs = RefStore::default();
        view.begin_update(Stream::from_text(text), "HEAD");
        let deadline = Instant::now() + Duration::from_secs(5);
        while view.is_loading() && Instant::now() < deadline {
            view.update(&refs, 100).unwrap();
        }
    }

    fn assert_invariant(view: &View) {
        if !view.lines.is_empty() {
            assert!(view.cursor < view.lines.len());
        }
        assert!(view.offset <= view.cursor);
        assert!(view.cursor < view.offset + view.height);
    }

    #[test]
    fn move_down_scrolls_when_leaving_screen() {
        let mut view = make_view(ViewKind::Log, 10, 3);
        for _ in 0..4 {
            view.move_cursor(Request::MoveDown).unwrap();
            assert_invariant(&view);
        }
        assert_eq!(view.cursor, 4);
        assert_eq!(view.offset, 2);
    }

    #[test]
    fn move_beyond_edges_reports() {
        let mut view = make_view(ViewKind::Log, 2, 5);
        assert_eq!(view.move_cursor(Request::MoveUp), Err("Cannot move beyond first line"));
        view.move_cursor(Request::MoveDown).unwrap();
        assert_eq!(view.move_cursor(Request::MoveDown), Err("Cannot move beyond last line"));
        assert_eq!(view.cursor, 1);
    }

    #[test]
    fn empty_view_cannot_move() {
        let mut view = make_view(ViewKind::Log, 0, 5);
        assert!(view.move_cursor(Request::MoveDown).is_err());
        assert!(view.move_cursor(Request::MoveLastLine).is_err());
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn page_moves_keep_invariant() {
        let mut view = make_view(ViewKind::Diff, 25, 10);
        view.move_cursor(Request::MovePageDown).unwrap();
        assert_eq!(view.cursor, 10);
        assert_eq!(view.offset, 10);
        view.move_cursor(Request::MovePageDown).unwrap();
        assert_eq!(view.cursor, 20);
        assert_eq!(view.offset, 15);
        assert_invariant(&view);
        view.move_cursor(Request::MovePageUp).unwrap();
        assert_eq!(view.cursor, 10);
        assert_eq!(view.offset, 5);
        assert_invariant(&view);
    }

    #[test]
    fn first_and_last_line() {
        let mut view = make_view(ViewKind::Diff, 25, 10);
        view.move_cursor(Request::MoveLastLine).unwrap();
        assert_eq!(view.cursor, 24);
        assert_invariant(&view);
        view.move_cursor(Request::MoveFirstLine).unwrap();
        assert_eq!((view.cursor, view.offset), (0, 0));
    }

    #[test]
    fn scroll_drags_cursor() {
        let mut view = make_view(ViewKind::Diff, 10, 3);
        view.scroll(Request::ScrollLineDown).unwrap();
        assert_eq!((view.offset, view.cursor), (1, 1));
        view.move_cursor(Request::MoveDown).unwrap();
        view.move_cursor(Request::MoveDown).unwrap();
        assert_eq!(view.cursor, 3);
        view.scroll(Request::ScrollLineUp).unwrap();
        assert_eq!((view.offset, view.cursor), (0, 2));
        assert_eq!(view.scroll(Request::ScrollLineUp), Err("Cannot scroll beyond the first line"));
    }

    #[test]
    fn scroll_stops_at_last_page() {
        let mut view = make_view(ViewKind::Diff, 4, 3);
        view.scroll(Request::ScrollLineDown).unwrap();
        assert!(view.scroll(Request::ScrollLineDown).is_err());
        assert_eq!(view.offset, 1);
    }

    #[test]
    fn walk_down_advances_one_line() {
        let mut view = make_view(ViewKind::Log, 6, 3);
        for expected in 1..6 {
            view.walk_down().unwrap();
            assert_eq!(view.cursor, expected);
            assert_invariant(&view);
        }
        assert!(view.walk_down().is_err());
        assert_eq!(view.cursor, 5);
    }

    #[test]
    fn shrinking_keeps_cursor_visible() {
        let mut view = make_view(ViewKind::Log, 30, 20);
        view.move_cursor(Request::MoveLastLine).unwrap();
        view.set_size(80, 5);
        assert_invariant(&view);
    }

    #[test]
    fn update_loads_stream_and_captures_ref() {
        let mut view = View::new(ViewKind::Diff);
        view.set_size(80, 10);
        load_text(&mut view, "commit 0123456789abcdef0123456789abcdef01234567\n\n\nAuthor: A\n");
        assert!(!view.is_loading());
        assert!(view.lines.is_sealed());
        // The doubled blank line collapses into one.
        assert_eq!(view.lines.len(), 3);
        assert_eq!(view.loaded_ref.as_deref(), Some("HEAD"));
        assert_eq!(
            view.capture_ref().as_deref(),
            Some("0123456789abcdef0123456789abcdef01234567")
        );
        assert_eq!(view.reference, "0123456789abcdef0123456789abcdef01234567");
    }

    #[test]
    fn stop_loading_forgets_loaded_ref() {
        let mut view = View::new(ViewKind::Log);
        view.begin_update(Stream::from_text("a\n"), "HEAD");
        view.stop_loading();
        assert!(!view.is_loading());
        assert_eq!(view.loaded_ref, None);
    }

    #[test]
    fn title_shows_position() {
        let mut view = make_view(ViewKind::Diff, 4, 10);
        view.reference = "abc".into();
        view.move_cursor(Request::MoveDown).unwrap();
        assert_eq!(view.title(), "[diff] abc - line 2 of 4 (50%)");
        assert_eq!(make_view(ViewKind::Help, 0, 10).title(), "[help]");
    }

    #[test]
    fn open_flags_compose() {
        let flags = OpenFlags::SPLIT.backgrounded();
        assert!(flags.split && flags.backgrounded && !flags.reload);
        assert!(OpenFlags::DEFAULT.reload().reload);
    }
}
