use ratatui::style::{Color, Modifier, Style};

use crate::app::LineType;

// ── Background colors ──
pub const BG: Color = Color::Rgb(12, 12, 12);
pub const PANEL: Color = Color::Rgb(26, 26, 26);
pub const CURSOR_BG: Color = Color::Rgb(26, 42, 58);

// ── Text colors ──
pub const TEXT: Color = Color::Rgb(200, 200, 200);
pub const DIM: Color = Color::Rgb(102, 102, 102);
pub const MUTED: Color = Color::Rgb(136, 136, 136);
pub const BRIGHT: Color = Color::Rgb(232, 232, 232);

// ── Accent colors ──
pub const BLUE: Color = Color::Rgb(96, 165, 250);
pub const CYAN: Color = Color::Rgb(34, 211, 238);
pub const GREEN: Color = Color::Rgb(74, 222, 128);
pub const YELLOW: Color = Color::Rgb(250, 204, 21);
pub const RED: Color = Color::Rgb(248, 113, 113);
pub const PURPLE: Color = Color::Rgb(167, 139, 250);

// ── Diff colors ──
pub const ADD_TEXT: Color = Color::Rgb(120, 240, 160);
pub const DEL_TEXT: Color = Color::Rgb(255, 140, 140);

// ── Composed styles ──

pub fn default_style() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn cursor_style() -> Style {
    Style::default()
        .fg(BRIGHT)
        .bg(CURSOR_BG)
        .add_modifier(Modifier::BOLD)
}

/// Title bar of the view receiving keys
pub fn title_focus() -> Style {
    Style::default()
        .fg(BG)
        .bg(BLUE)
        .add_modifier(Modifier::BOLD)
}

/// Title bar of the other displayed view
pub fn title_blur() -> Style {
    Style::default().fg(MUTED).bg(PANEL)
}

pub fn status_style() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn line_number() -> Style {
    Style::default().fg(DIM)
}

/// Style of a pager line by its type.
pub fn line_style(kind: LineType) -> Style {
    let base = Style::default();
    match kind {
        LineType::DiffHeader | LineType::DiffTree => base.fg(YELLOW),
        LineType::DiffChunk => base.fg(PURPLE),
        LineType::DiffAdd => base.fg(ADD_TEXT),
        LineType::DiffDel => base.fg(DEL_TEXT),
        LineType::DiffIndex => base.fg(BLUE),
        LineType::DiffOldFile | LineType::DiffNewFile => base.fg(BLUE),
        LineType::DiffMode | LineType::DiffCopy | LineType::DiffRename => base.fg(CYAN),
        LineType::DiffSimilarity | LineType::DiffStat => base.fg(MUTED),
        LineType::Commit => base.fg(GREEN).add_modifier(Modifier::BOLD),
        LineType::PpAuthor | LineType::Author | LineType::Committer => base.fg(CYAN),
        LineType::PpCommit | LineType::PpMerge | LineType::Parent | LineType::Tree => {
            base.fg(BLUE)
        }
        LineType::PpDate => base.fg(YELLOW),
        LineType::Signoff => base.fg(YELLOW),
        LineType::Default | LineType::MainCommit => base.fg(TEXT),
    }
}

// ── Main view columns ──

pub fn main_date() -> Style {
    Style::default().fg(BLUE)
}

pub fn main_author() -> Style {
    Style::default().fg(GREEN)
}

/// Brackets around refs and the `~` of a trimmed author
pub fn main_delim() -> Style {
    Style::default().fg(MUTED)
}

pub fn main_tag() -> Style {
    Style::default().fg(YELLOW).add_modifier(Modifier::BOLD)
}

pub fn main_ref() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

pub fn main_commit() -> Style {
    Style::default().fg(TEXT)
}

pub fn error_style() -> Style {
    Style::default().fg(RED)
}
