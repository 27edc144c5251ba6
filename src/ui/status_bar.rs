use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::App;

/// Compute the display width of a list of spans
fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

/// Render the status line: the last message on the left, a key hint and
/// loading marker on the right.
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut left: Vec<Span> = Vec::new();
    if let Some(msg) = &app.status_message {
        let style = if msg.starts_with("Failed") {
            styles::error_style()
        } else {
            styles::status_style()
        };
        left.push(Span::styled(msg.clone(), style));
    }

    let mut right: Vec<Span> = Vec::new();
    if app.is_loading() {
        right.push(Span::styled("loading ", styles::line_number()));
    }
    right.push(Span::styled("h", styles::main_ref()));
    right.push(Span::styled(" help ", styles::line_number()));

    let used = spans_width(&left) + spans_width(&right);
    let pad = (area.width as usize).saturating_sub(used);
    let mut spans = left;
    if pad > 0 {
        spans.push(Span::raw(" ".repeat(pad)));
        spans.extend(right);
    }

    f.render_widget(Paragraph::new(Line::from(spans)).style(styles::status_style()), area);
}
