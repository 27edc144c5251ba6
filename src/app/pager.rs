use ratatui::text::Span;

use super::buffer::{Line, LineBuffer, LineType};
use super::main_view::ID_LEN;
use super::view::{DrawContext, DrawnLine, EnterAction, EnterContext, OpenFlags, ViewKind, ViewOps};
use crate::git::RefStore;
use crate::ui::styles;
use crate::ui::width::clip;

/// Width of the `%4d: ` line number gutter
const LINE_NUMBER_COLS: usize = 6;

/// Free-form text: diff, log, help and stdin views.
#[derive(Debug, Default)]
pub struct PagerOps;

impl PagerOps {
    pub fn new() -> Self {
        PagerOps
    }
}

/// Id on a `commit <id>` header line.
fn commit_id(line: &Line) -> Option<String> {
    if line.kind != LineType::Commit {
        return None;
    }
    let id = line.as_text()?.strip_prefix("commit ")?.split_whitespace().next()?;
    Some(id.chars().take(ID_LEN).collect())
}

/// Replace tabs with spaces up to the next tab stop.
pub fn expand_tabs(text: &str, tab_size: usize) -> String {
    let tab_size = tab_size.max(1);
    let mut out = String::with_capacity(text.len());
    let mut col = 0;
    for c in text.chars() {
        if c == '\t' {
            let pad = tab_size - (col % tab_size);
            out.push_str(&" ".repeat(pad));
            col += pad;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

impl ViewOps for PagerOps {
    fn item_label(&self) -> &'static str {
        "line"
    }

    fn read(&mut self, buffer: &mut LineBuffer, _refs: &RefStore, text: String) {
        let last_blank = buffer
            .last()
            .and_then(Line::as_text)
            .is_some_and(str::is_empty);
        if text.is_empty() && last_blank {
            return;
        }
        buffer.push(Line::text(text));
    }

    fn draw(&self, line: &Line, ctx: &DrawContext) -> DrawnLine {
        let text = line.as_text().unwrap_or_default();
        let mut spans = Vec::new();
        let mut width = ctx.width;

        if ctx.line_number > 0 {
            let lineno = ctx.lineno + 1;
            let gutter = if ctx.lineno == 0 || lineno % ctx.line_number == 0 {
                format!("{:4}: ", lineno)
            } else {
                " ".repeat(LINE_NUMBER_COLS)
            };
            spans.push(Span::styled(gutter, styles::line_number()));
            width = width.saturating_sub(LINE_NUMBER_COLS);
        }

        let expanded = expand_tabs(text, ctx.tab_size);
        let (visible, _) = clip(&expanded, width, ctx.utf8);
        spans.push(Span::styled(visible.to_string(), styles::line_style(line.kind)));

        DrawnLine {
            line: ratatui::text::Line::from(spans),
            captured_ref: if ctx.selected { commit_id(line) } else { None },
        }
    }

    fn enter(&self, line: &Line, ctx: &EnterContext) -> EnterAction {
        let open_diff = match ctx.kind {
            ViewKind::Log | ViewKind::Pager => {
                commit_id(line).map(|id| (id, OpenFlags::SPLIT.backgrounded()))
            }
            _ => None,
        };
        EnterAction {
            open_diff,
            walk: true,
        }
    }

    fn selected_ref(&self, line: &Line) -> Option<String> {
        commit_id(line)
    }
}
