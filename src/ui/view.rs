use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, DrawContext, ViewKind};

/// Render one view's visible lines into `body` and its title bar into `title`.
pub fn render(f: &mut Frame, body: Rect, title: Rect, app: &mut App, kind: ViewKind, focused: bool) {
    let display = app.config.display.clone();
    let view = app.view_mut(kind);

    let end = (view.offset + body.height as usize).min(view.lines.len());
    let mut rows: Vec<Line<'static>> = Vec::with_capacity(body.height as usize);
    for index in view.offset..end {
        let ctx = DrawContext {
            width: body.width as usize,
            lineno: index,
            selected: index == view.cursor,
            utf8: display.utf8,
            tab_size: display.tab_size,
            line_number: display.line_number,
        };
        let Some(mut drawn) = view.draw_line(index, &ctx) else {
            break;
        };
        if ctx.selected {
            for span in drawn.line.spans.iter_mut() {
                span.style = styles::cursor_style();
            }
            drawn.line = drawn.line.style(styles::cursor_style());
        }
        if let Some(reference) = drawn.captured_ref {
            view.reference = reference;
        }
        rows.push(drawn.line);
    }
    f.render_widget(Paragraph::new(rows).style(styles::default_style()), body);

    let title_style = if focused {
        styles::title_focus()
    } else {
        styles::title_blur()
    };
    let bar = Paragraph::new(Line::from(Span::styled(view.title(), title_style))).style(title_style);
    f.render_widget(bar, title);
}
