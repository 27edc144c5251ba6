mod status_bar;
pub mod styles;
mod view;
pub mod width;

use crate::app::{slot_rows, App, ViewKind};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

/// Render the entire UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    app.resize(area.width, area.height);

    let displayed: Vec<ViewKind> = app.displayed().collect();
    let rows = slot_rows(area.height, displayed.len());

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(rows[0]), // top (or only) view
            Constraint::Length(rows[1]), // split child
            Constraint::Length(1),       // status line
        ])
        .split(area);

    let current = app.current_kind();
    for (slot, kind) in displayed.into_iter().enumerate() {
        // Each view's title bar sits below its body.
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(outer[slot]);
        view::render(f, parts[0], parts[1], app, kind, current == Some(kind));
    }

    status_bar::render(f, outer[2], app);
}
