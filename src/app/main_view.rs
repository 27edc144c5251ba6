//! Main view: one summary row per commit, parsed from `--pretty=raw` output.

use chrono::{DateTime, FixedOffset, TimeZone};
use ratatui::text::Span;

use super::buffer::{Line, LineBuffer};
use super::view::{DrawContext, DrawnLine, EnterAction, EnterContext, OpenFlags, ViewOps};
use crate::git::{Ref, RefStore};
use crate::ui::styles;
use crate::ui::width::{clip, utf8_length};

/// Length of a full commit id
pub const ID_LEN: usize = 40;
/// Longest title kept from a commit message, in characters
pub const MAX_TITLE_CHARS: usize = 74;
/// Longest author name kept, in characters
pub const MAX_AUTHOR_CHARS: usize = 74;
/// Author column width, including two columns of padding
pub const AUTHOR_COLS: usize = 20;
/// Date column width: "YYYY-MM-DD HH:MM "
pub const DATE_COLS: usize = 17;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M ";

/// A commit summary
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub id: String,
    pub title: String,
    pub author: String,
    pub time: Option<DateTime<FixedOffset>>,
    pub refs: Vec<Ref>,
}

impl Commit {
    fn new(id: &str) -> Self {
        Commit {
            id: id.chars().take(ID_LEN).collect(),
            title: String::new(),
            author: String::new(),
            time: None,
            refs: Vec::new(),
        }
    }
}

/// Parse `Name <email> 1146420000 +0200` into a name and a zoned time.
pub fn parse_ident(ident: &str) -> (String, Option<DateTime<FixedOffset>>) {
    let (name, rest) = match ident.find('<') {
        Some(lt) => (&ident[..lt], &ident[lt..]),
        None => (ident, ""),
    };
    let name: String = name.trim().chars().take(MAX_AUTHOR_CHARS).collect();

    let after_email = rest.rfind('>').map(|gt| &rest[gt + 1..]).unwrap_or("");
    let mut fields = after_email.split_whitespace();
    let time = fields.next().and_then(|secs| secs.parse::<i64>().ok()).and_then(|secs| {
        let offset = fields.next().and_then(parse_tz).unwrap_or(0);
        let tz = FixedOffset::east_opt(offset)?;
        tz.timestamp_opt(secs, 0).single()
    });

    (name, time)
}

/// `+0200` → seconds east of UTC
fn parse_tz(tz: &str) -> Option<i32> {
    let (sign, digits) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Accumulates raw log lines into commits.
#[derive(Debug, Default)]
pub struct MainOps {
    pending: Option<Commit>,
}

impl MainOps {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush(&mut self, buffer: &mut LineBuffer, refs: &RefStore) {
        if let Some(mut commit) = self.pending.take() {
            commit.refs = refs.get(&commit.id).to_vec();
            buffer.push(Line::commit(commit));
        }
    }
}

impl ViewOps for MainOps {
    fn item_label(&self) -> &'static str {
        "commit"
    }

    fn read(&mut self, buffer: &mut LineBuffer, refs: &RefStore, text: String) {
        if let Some(id) = text.strip_prefix("commit ") {
            self.flush(buffer, refs);
            let id = id.split_whitespace().next().unwrap_or("");
            self.pending = Some(Commit::new(id));
            return;
        }

        let Some(commit) = self.pending.as_mut() else {
            return;
        };

        if let Some(ident) = text.strip_prefix("author ") {
            let (author, time) = parse_ident(ident);
            commit.author = author;
            commit.time = time;
        } else if text.is_empty() {
            // The blank line after the message title ends the record; the one
            // between the headers and the message does not.
            if !commit.title.is_empty() {
                self.flush(buffer, refs);
            }
        } else if commit.title.is_empty() && text.starts_with("    ") {
            let title = text.trim();
            if !title.is_empty() {
                commit.title = title.chars().take(MAX_TITLE_CHARS).collect();
            }
        }
    }

    fn finish(&mut self, buffer: &mut LineBuffer, refs: &RefStore) {
        self.flush(buffer, refs);
    }

    fn reset(&mut self) {
        self.pending = None;
    }

    fn draw(&self, line: &Line, ctx: &DrawContext) -> DrawnLine {
        let Some(commit) = line.as_commit() else {
            return DrawnLine::default();
        };

        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut col = 0;

        if let Some(time) = commit.time {
            spans.push(Span::styled(time.format(DATE_FORMAT).to_string(), styles::main_date()));
        } else {
            spans.push(Span::raw(" ".repeat(DATE_COLS)));
        }
        col += DATE_COLS;

        let (author, used, trimmed) = fit_author(&commit.author, ctx.utf8);
        spans.push(Span::styled(author, styles::main_author()));
        let mut used = used;
        if trimmed {
            spans.push(Span::styled("~", styles::main_delim()));
            used += 1;
        }
        spans.push(Span::raw(" ".repeat(AUTHOR_COLS.saturating_sub(used))));
        col += AUTHOR_COLS.max(used);

        for r in &commit.refs {
            let style = if r.is_tag() { styles::main_tag() } else { styles::main_ref() };
            spans.push(Span::styled("[", styles::main_delim()));
            spans.push(Span::styled(r.name.clone(), style));
            spans.push(Span::styled("]", styles::main_delim()));
            col += r.name.chars().count() + 2;
            // The last ref of the group is set off from the title.
            if !r.next {
                spans.push(Span::raw(" "));
                col += 1;
            }
        }

        let remaining = ctx.width.saturating_sub(col);
        let (title, _) = clip(&commit.title, remaining, ctx.utf8);
        spans.push(Span::styled(title.to_string(), styles::main_commit()));

        DrawnLine {
            line: ratatui::text::Line::from(spans),
            captured_ref: ctx.selected.then(|| commit.id.clone()),
        }
    }

    fn enter(&self, line: &Line, ctx: &EnterContext) -> EnterAction {
        let Some(commit) = line.as_commit() else {
            return EnterAction::default();
        };
        let flags = if ctx.fullscreen { OpenFlags::SPLIT } else { OpenFlags::DEFAULT };
        EnterAction {
            open_diff: Some((commit.id.clone(), flags)),
            walk: false,
        }
    }

    fn selected_ref(&self, line: &Line) -> Option<String> {
        line.as_commit().map(|c| c.id.clone())
    }
}

/// Cut an author name to the author column. Returns the visible text, the
/// columns it occupies and whether it was trimmed.
pub fn fit_author(author: &str, utf8: bool) -> (String, usize, bool) {
    let budget = AUTHOR_COLS - 2;
    if utf8 {
        let fit = utf8_length(author.as_bytes(), budget, 0);
        let visible = author.get(..fit.bytes).unwrap_or("");
        (visible.to_string(), fit.columns(0), fit.trimmed)
    } else {
        // Lines arrive decoded, so one character stands in for one byte.
        let (visible, cols) = clip(author, budget, false);
        (visible.to_string(), cols, visible.len() < author.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::view::ViewKind;

    const ID_A: &str = "1111111111111111111111111111111111111111";
    const ID_B: &str = "2222222222222222222222222222222222222222";

    fn raw_record(id: &str, author: &str, title: &str) -> Vec<String> {
        vec![
            format!("commit {}", id),
            "tree 3333333333333333333333333333333333333333".into(),
            "parent 4444444444444444444444444444444444444444".into(),
            format!("author {} <a@example.com> 1146420000 +0200", author),
            format!("committer {} <a@example.com> 1146420000 +0200", author),
            String::new(),
            format!("    {}", title),
            String::new(),
            "    Longer description.".into(),
            String::new(),
            " src/main.rs | 2 +-".into(),
            " 1 file changed, 1 insertion(+), 1 deletion(-)".into(),
            String::new(),
        ]
    }

    fn load(records: &[Vec<String>], refs: &RefStore) -> LineBuffer {
        let mut ops = MainOps::new();
        let mut buffer = LineBuffer::new();
        for line in records.iter().flatten() {
            ops.read(&mut buffer, refs, line.clone());
        }
        ops.finish(&mut buffer, refs);
        buffer
    }

    fn ctx(width: usize, utf8: bool) -> DrawContext {
        DrawContext {
            width,
            lineno: 0,
            selected: false,
            utf8,
            tab_size: 8,
            line_number: 0,
        }
    }

    fn text_of(line: &ratatui::text::Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn parses_one_commit_per_record() {
        let refs = RefStore::default();
        let buffer = load(
            &[raw_record(ID_A, "A U Thor", "First"), raw_record(ID_B, "Bob", "Second")],
            &refs,
        );
        assert_eq!(buffer.len(), 2);
        let first = buffer.get(0).and_then(Line::as_commit).unwrap();
        assert_eq!(first.id, ID_A);
        assert_eq!(first.author, "A U Thor");
        assert_eq!(first.title, "First");
        let time = first.time.unwrap();
        assert_eq!(time.format("%Y-%m-%d %H:%M %z").to_string(), "2006-04-30 20:00 +0200");
        assert_eq!(buffer.get(1).and_then(Line::as_commit).unwrap().title, "Second");
    }

    #[test]
    fn record_without_trailing_blank_is_flushed_at_end() {
        let refs = RefStore::default();
        let buffer = load(
            &[vec![format!("commit {}", ID_A), "author X <x@y> 0 +0000".into(), String::new(), "    Only".into()]],
            &refs,
        );
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(0).and_then(Line::as_commit).unwrap().title, "Only");
    }

    #[test]
    fn refs_are_looked_up_when_the_record_ends() {
        let refs = RefStore::parse(&format!(
            "{id}\trefs/heads/master\n{id}\trefs/tags/v1.0^{{}}\n",
            id = ID_A
        ));
        let buffer = load(&[raw_record(ID_A, "A", "Tagged")], &refs);
        let commit = buffer.get(0).and_then(Line::as_commit).unwrap();
        let names: Vec<&str> = commit.refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["master", "v1.0"]);
    }

    #[test]
    fn long_title_is_bounded() {
        let refs = RefStore::default();
        let title = "x".repeat(200);
        let buffer = load(&[raw_record(ID_A, "A", &title)], &refs);
        let commit = buffer.get(0).and_then(Line::as_commit).unwrap();
        assert_eq!(commit.title.len(), MAX_TITLE_CHARS);
    }

    #[test]
    fn lines_before_first_commit_are_ignored() {
        let refs = RefStore::default();
        let mut ops = MainOps::new();
        let mut buffer = LineBuffer::new();
        ops.read(&mut buffer, &refs, "    stray".into());
        ops.read(&mut buffer, &refs, String::new());
        ops.finish(&mut buffer, &refs);
        assert!(buffer.is_empty());
    }

    #[test]
    fn parse_ident_handles_negative_zone() {
        let (name, time) = parse_ident("Jonas F <j@f> 1146420000 -0130");
        assert_eq!(name, "Jonas F");
        assert_eq!(time.unwrap().offset().local_minus_utc(), -(3600 + 30 * 60));
    }

    #[test]
    fn parse_ident_without_time() {
        let (name, time) = parse_ident("Nobody");
        assert_eq!(name, "Nobody");
        assert!(time.is_none());
    }

    #[test]
    fn short_multibyte_author_fits_untrimmed() {
        let (text, cols, trimmed) = fit_author("A Úlfarsdóttir", true);
        assert_eq!(text, "A Úlfarsdóttir");
        assert_eq!(cols, 14);
        assert!(!trimmed);
    }

    #[test]
    fn long_multibyte_author_is_trimmed_to_eighteen_columns() {
        let author = "A Úlfarsdóttir Þórðardóttir";
        let (text, cols, trimmed) = fit_author(author, true);
        assert!(trimmed);
        assert_eq!(cols, 18);
        assert!(text.len() > cols, "multi-byte text has more bytes than columns");
        assert_eq!(text, "A Úlfarsdóttir Þór");
    }

    #[test]
    fn byte_truncation_when_utf8_is_off() {
        let (text, cols, trimmed) = fit_author("abcdefghijklmnopqrstuvwxyz", false);
        assert_eq!(text, "abcdefghijklmnopqr");
        assert_eq!(cols, 18);
        assert!(trimmed);
    }

    #[test]
    fn undecodable_author_keeps_title_column_when_utf8_is_off() {
        let refs = RefStore::default();
        let author = "J\u{FFFD}rg \u{FFFD}lsen Schmidtbauer";
        let (text, cols, trimmed) = fit_author(author, false);
        assert_eq!(text, "J\u{FFFD}rg \u{FFFD}lsen Schmidt");
        assert_eq!(cols, 18);
        assert!(trimmed);

        let buffer = load(&[raw_record(ID_A, author, "Title")], &refs);
        let drawn = MainOps::new().draw(buffer.get(0).unwrap(), &ctx(120, false));
        let row = text_of(&drawn.line);
        assert_eq!(row.chars().count() - "Title".len(), DATE_COLS + AUTHOR_COLS);
    }

    #[test]
    fn wide_title_is_clipped_by_columns() {
        let refs = RefStore::default();
        let buffer = load(&[raw_record(ID_A, "Bob", "中文提交标题")], &refs);
        let drawn = MainOps::new().draw(buffer.get(0).unwrap(), &ctx(DATE_COLS + AUTHOR_COLS + 5, true));
        assert!(text_of(&drawn.line).ends_with("Bob                 中文"));
    }

    #[test]
    fn draw_renders_date_author_refs_and_title() {
        let refs = RefStore::parse(&format!(
            "{id}\trefs/tags/v1.0^{{}}\n{id}\trefs/heads/master\n",
            id = ID_A
        ));
        let buffer = load(&[raw_record(ID_A, "Bob", "Fix it")], &refs);
        let ops = MainOps::new();
        let drawn = ops.draw(buffer.get(0).unwrap(), &ctx(120, true));
        let text = text_of(&drawn.line);
        assert!(text.starts_with("2006-04-30 20:00 Bob"));
        let author_field = &text[DATE_COLS..DATE_COLS + AUTHOR_COLS];
        assert_eq!(author_field, format!("{:<20}", "Bob"));
        assert!(text.ends_with("[v1.0][master] Fix it"));
        assert!(drawn.captured_ref.is_none());
    }

    #[test]
    fn draw_marks_trimmed_author_and_keeps_alignment() {
        let refs = RefStore::default();
        let buffer = load(
            &[raw_record(ID_A, "A Úlfarsdóttir Þórðardóttir", "Title"), raw_record(ID_B, "Bob", "Title")],
            &refs,
        );
        let ops = MainOps::new();
        let first = text_of(&ops.draw(buffer.get(0).unwrap(), &ctx(120, true)).line);
        let second = text_of(&ops.draw(buffer.get(1).unwrap(), &ctx(120, true)).line);
        assert!(first.contains("Þór~"));
        // Both rows put the title at the same column.
        let col = |s: &str| s.chars().count() - "Title".len();
        assert_eq!(col(&first), col(&second));
        assert_eq!(col(&second), DATE_COLS + AUTHOR_COLS);
    }

    #[test]
    fn draw_clips_title_to_width() {
        let refs = RefStore::default();
        let buffer = load(&[raw_record(ID_A, "Bob", "A rather long commit title")], &refs);
        let ops = MainOps::new();
        let drawn = ops.draw(buffer.get(0).unwrap(), &ctx(DATE_COLS + AUTHOR_COLS + 8, true));
        assert!(text_of(&drawn.line).ends_with("A rather"));
    }

    #[test]
    fn selected_row_captures_commit_id() {
        let refs = RefStore::default();
        let buffer = load(&[raw_record(ID_A, "Bob", "T")], &refs);
        let ops = MainOps::new();
        let mut c = ctx(80, true);
        c.selected = true;
        assert_eq!(ops.draw(buffer.get(0).unwrap(), &c).captured_ref.as_deref(), Some(ID_A));
    }

    #[test]
    fn enter_splits_only_from_fullscreen() {
        let refs = RefStore::default();
        let buffer = load(&[raw_record(ID_A, "Bob", "T")], &refs);
        let ops = MainOps::new();
        let line = buffer.get(0).unwrap();

        let action = ops.enter(line, &EnterContext { kind: ViewKind::Main, fullscreen: true });
        assert_eq!(action.open_diff, Some((ID_A.to_string(), OpenFlags::SPLIT)));
        assert!(!action.walk);

        let action = ops.enter(line, &EnterContext { kind: ViewKind::Main, fullscreen: false });
        assert_eq!(action.open_diff, Some((ID_A.to_string(), OpenFlags::DEFAULT)));
    }
}
