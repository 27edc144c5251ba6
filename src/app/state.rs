use super::loader::LoadError;
use super::request::{help_text, Request};
use super::view::{OpenFlags, View, ViewKind};
use crate::config::Config;
use crate::git::{format_command, CommandRunner, RefStore, Stream};

/// Lines moved from each loading view's stream per tick
pub const LINES_PER_TICK: usize = 500;

/// Idle ticks before a status message is cleared
const STATUS_TICKS: u8 = 20;

/// Reference the main and log views start from
const HEAD_REF: &str = "HEAD";

/// Screen rows, title included, given to each display slot. The bottom row
/// of the screen belongs to the status line; a split child gets two thirds.
pub fn slot_rows(screen_height: u16, displayed: usize) -> [u16; 2] {
    let total = screen_height.saturating_sub(1);
    if displayed < 2 {
        return [total, 0];
    }
    let child = total * 2 / 3;
    [total - child, child]
}

pub struct App {
    /// One persistent view per kind, indexed by [`ViewKind::index`]
    views: Vec<View>,

    /// Displayed views, top to bottom
    display: [Option<ViewKind>; 2],

    /// Display slot receiving key input
    current: usize,

    pub refs: RefStore,
    pub config: Config,
    runner: Box<dyn CommandRunner>,

    /// Piped stdin, consumed by the first load of the pager view
    pager_input: Option<Stream>,

    /// Reference followed by the main and log views
    ref_head: String,

    /// Commit under the cursor, followed by the diff view
    ref_commit: String,

    /// Terminal size (width, height)
    screen: (u16, u16),

    /// Should the app quit?
    pub should_quit: bool,

    /// Clear and repaint the whole terminal on the next frame
    pub needs_clear: bool,

    /// Last status message
    pub status_message: Option<String>,

    /// Ticks since the status message was set (for auto-clearing)
    pub status_ticks: u8,
}

impl App {
    pub fn new(
        config: Config,
        refs: RefStore,
        runner: Box<dyn CommandRunner>,
        pager_input: Option<Stream>,
    ) -> Self {
        let mut app = App {
            views: ViewKind::ALL.iter().map(|&kind| View::new(kind)).collect(),
            display: [None, None],
            current: 0,
            refs,
            config,
            runner,
            pager_input,
            ref_head: HEAD_REF.to_string(),
            ref_commit: HEAD_REF.to_string(),
            screen: (80, 24),
            should_quit: false,
            needs_clear: false,
            status_message: None,
            status_ticks: 0,
        };
        app.resize_views();
        app
    }

    // ── View registry ──

    pub fn view(&self, kind: ViewKind) -> &View {
        &self.views[kind.index()]
    }

    pub fn view_mut(&mut self, kind: ViewKind) -> &mut View {
        &mut self.views[kind.index()]
    }

    /// Displayed views, top to bottom.
    pub fn displayed(&self) -> impl Iterator<Item = ViewKind> + '_ {
        self.display.iter().flatten().copied()
    }

    pub fn displayed_count(&self) -> usize {
        self.displayed().count()
    }

    pub fn is_displayed(&self, kind: ViewKind) -> bool {
        self.display.contains(&Some(kind))
    }

    pub fn current_kind(&self) -> Option<ViewKind> {
        self.display[self.current]
    }

    pub fn is_loading(&self) -> bool {
        self.views.iter().any(View::is_loading)
    }

    /// Reference a view of this kind should be loaded for.
    fn wanted_ref(&self, kind: ViewKind) -> String {
        match kind {
            ViewKind::Main | ViewKind::Log => self.ref_head.clone(),
            ViewKind::Diff => self.ref_commit.clone(),
            ViewKind::Help | ViewKind::Pager => String::new(),
        }
    }

    /// The view's content does not match its wanted reference, either
    /// because the reference moved or because its last load was cut short.
    /// Piped input can only be read once, so a drained pager keeps what it has.
    fn needs_load(&self, kind: ViewKind) -> bool {
        if kind == ViewKind::Pager && self.pager_input.is_none() {
            return false;
        }
        self.view(kind).loaded_ref.as_deref() != Some(self.wanted_ref(kind).as_str())
    }

    fn command_template(&self, kind: ViewKind) -> &str {
        match kind {
            ViewKind::Main => &self.config.commands.main,
            ViewKind::Diff => &self.config.commands.diff,
            ViewKind::Log => &self.config.commands.log,
            ViewKind::Help | ViewKind::Pager => "",
        }
    }

    // ── Loading ──

    /// Start (or restart) the load of a view for its current reference.
    fn start_load(&mut self, kind: ViewKind) -> Result<(), LoadError> {
        let reference = self.wanted_ref(kind);
        let stream = match kind {
            ViewKind::Help => Stream::from_text(help_text()),
            ViewKind::Pager => self
                .pager_input
                .take()
                .ok_or(LoadError::NoSource(kind.name()))?,
            ViewKind::Main | ViewKind::Diff | ViewKind::Log => {
                let command = format_command(self.command_template(kind), &reference)?;
                tracing::debug!(target: "app", view = kind.name(), %command, "spawn");
                self.runner
                    .spawn(&command)
                    .map_err(|source| LoadError::Spawn { command, source })?
            }
        };
        self.view_mut(kind).begin_update(stream, &reference);
        Ok(())
    }

    fn report_load_error(&mut self, kind: ViewKind, err: LoadError) {
        tracing::warn!(target: "app", view = kind.name(), %err, "view_load_failed");
        self.notify(&format!("Failed to load {} view: {}", kind.name(), err));
    }

    /// Drain ready output into every loading view. Returns whether anything
    /// changed on screen.
    pub fn update_views(&mut self) -> bool {
        let mut changed = false;
        for kind in ViewKind::ALL {
            let view = &mut self.views[kind.index()];
            if !view.is_loading() {
                continue;
            }
            let result = view.update(&self.refs, LINES_PER_TICK);
            // The title's elapsed time moves even when no lines arrive.
            changed |= self.is_displayed(kind);
            match result {
                Ok(true) if self.current_kind() == Some(kind) => {
                    self.selection_changed(kind, false)
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(target: "app", view = kind.name(), %err, "view_read_failed");
                    self.notify(&format!("Failed to read {} view: {}", kind.name(), err));
                }
            }
        }
        changed
    }

    // ── View stack ──

    /// Bring a view on screen, loading it first if its content is stale.
    pub fn open_view(&mut self, kind: ViewKind, flags: OpenFlags) {
        let prev = self.current_kind();
        let old_display = self.display;

        let stale = self.needs_load(kind);
        if prev == Some(kind) && self.displayed_count() == 1 && !flags.reload && !stale {
            self.notify(&format!("Already in {} view", kind.name()));
            return;
        }
        if kind == ViewKind::Pager
            && self.pager_input.is_none()
            && self.view(kind).loaded_ref.is_none()
            && self.view(kind).lines.is_empty()
        {
            self.notify("The pager view is only available when input is piped");
            return;
        }

        if flags.reload || stale {
            if let Err(err) = self.start_load(kind) {
                self.view_mut(kind).stop_loading();
                self.report_load_error(kind, err);
                return;
            }
        }

        // A split child already on screen is reloaded where it is.
        let in_place = flags.split && self.displayed_count() == 2 && self.is_displayed(kind);
        let opener = if flags.split {
            prev.filter(|&p| p != kind)
        } else {
            None
        };
        if !in_place {
            self.display = match opener {
                Some(opener) => [Some(opener), Some(kind)],
                None => [Some(kind), None],
            };
            self.current = if opener.is_some() && !flags.backgrounded {
                1
            } else {
                0
            };
        }

        // Views pushed off screen stop loading.
        for old in old_display.into_iter().flatten() {
            if !self.is_displayed(old) {
                self.view_mut(old).stop_loading();
            }
        }

        if let Some(prev) = prev.filter(|&p| p != kind) {
            self.view_mut(kind).parent = Some(prev);
            self.view_mut(prev).parent = None;
        }

        if old_display != self.display {
            self.resize_views();
        }

        tracing::info!(
            target: "app",
            view = kind.name(),
            split = opener.is_some(),
            backgrounded = flags.backgrounded,
            "view_opened"
        );
    }

    /// Tab: move key focus to the other displayed view.
    pub fn switch_view(&mut self) {
        if self.displayed_count() == 2 {
            self.current = 1 - self.current;
        }
    }

    /// Close the current view, returning to its parent if it has one.
    /// Closing the last view quits.
    pub fn close_view(&mut self) {
        let Some(kind) = self.current_kind() else {
            self.should_quit = true;
            return;
        };

        let parent = self.view(kind).parent.filter(|&p| p != kind);
        let other = self.displayed().find(|&k| k != kind);
        let Some(next) = parent.or(other) else {
            self.should_quit = true;
            return;
        };

        self.view_mut(kind).stop_loading();
        self.view_mut(kind).parent = None;
        if let Some(other) = other.filter(|&o| o != next) {
            self.view_mut(other).stop_loading();
        }
        if self.view(next).parent == Some(kind) {
            self.view_mut(next).parent = None;
        }

        self.display = [Some(next), None];
        self.current = 0;
        if self.needs_load(next) {
            if let Err(err) = self.start_load(next) {
                self.view_mut(next).stop_loading();
                self.report_load_error(next, err);
            }
        }
        self.resize_views();
        tracing::info!(target: "app", view = kind.name(), back_to = next.name(), "view_closed");
    }

    // ── Requests ──

    pub fn dispatch(&mut self, request: Request) {
        match request {
            Request::ViewMain => self.open_view(ViewKind::Main, OpenFlags::DEFAULT),
            Request::ViewDiff => self.open_view(ViewKind::Diff, OpenFlags::DEFAULT),
            Request::ViewLog => self.open_view(ViewKind::Log, OpenFlags::DEFAULT),
            Request::ViewHelp => self.open_view(ViewKind::Help, OpenFlags::DEFAULT),
            Request::ViewPager => self.open_view(ViewKind::Pager, OpenFlags::DEFAULT),
            Request::Enter => self.enter(),
            Request::SwitchView => self.switch_view(),
            Request::ViewClose => self.close_view(),
            Request::Next
            | Request::Previous
            | Request::MoveUp
            | Request::MoveDown
            | Request::MovePageUp
            | Request::MovePageDown
            | Request::MoveFirstLine
            | Request::MoveLastLine => self.move_cursor(request),
            Request::ScrollLineUp | Request::ScrollLineDown => self.scroll(request),
            Request::ShowVersion => {
                self.notify(&format!("tigr-{}", env!("CARGO_PKG_VERSION")));
            }
            Request::ScreenRedraw => self.needs_clear = true,
            Request::Quit | Request::QuitAll => self.should_quit = true,
        }
    }

    fn move_cursor(&mut self, request: Request) {
        let Some(current) = self.current_kind() else {
            return;
        };

        // Line moves in a split diff walk its parent instead.
        let mut target = current;
        if current == ViewKind::Diff
            && matches!(
                request,
                Request::Next | Request::Previous | Request::MoveUp | Request::MoveDown
            )
        {
            if let Some(parent) = self.view(current).parent {
                if matches!(parent, ViewKind::Main | ViewKind::Log) && self.is_displayed(parent) {
                    target = parent;
                }
            }
        }

        match self.view_mut(target).move_cursor(request) {
            Ok(()) => {
                self.clear_status();
                self.selection_changed(target, true);
            }
            Err(msg) => self.notify(msg),
        }
    }

    fn scroll(&mut self, request: Request) {
        let Some(current) = self.current_kind() else {
            return;
        };
        match self.view_mut(current).scroll(request) {
            Ok(()) => {
                self.clear_status();
                self.selection_changed(current, false);
            }
            Err(msg) => self.notify(msg),
        }
    }

    fn enter(&mut self) {
        let Some(kind) = self.current_kind() else {
            return;
        };
        let fullscreen = self.displayed_count() == 1;
        let action = self.view(kind).enter(fullscreen);

        if let Some((id, flags)) = action.open_diff {
            self.ref_commit = id;
            self.open_view(ViewKind::Diff, flags);
        }
        if action.walk {
            match self.view_mut(kind).walk_down() {
                Ok(()) => self.selection_changed(kind, false),
                Err(msg) => self.notify(msg),
            }
        }
    }

    /// The cursor of `kind` moved. Track the commit under it and, when
    /// `follow` is set, keep a split diff opened from this view in sync.
    fn selection_changed(&mut self, kind: ViewKind, follow: bool) {
        let Some(id) = self.view_mut(kind).capture_ref() else {
            return;
        };
        if kind == ViewKind::Diff {
            return;
        }
        self.ref_commit = id;

        let diff = self.view(ViewKind::Diff);
        let linked = self.is_displayed(ViewKind::Diff) && diff.parent == Some(kind);
        if follow && linked && diff.loaded_ref.as_deref() != Some(self.ref_commit.as_str()) {
            tracing::debug!(target: "app", commit = %self.ref_commit, "split_diff_follow");
            self.open_view(ViewKind::Diff, OpenFlags::SPLIT.backgrounded().reload());
        }
    }

    // ── Screen ──

    pub fn resize(&mut self, width: u16, height: u16) {
        if self.screen != (width, height) {
            self.screen = (width, height);
            self.resize_views();
        }
    }

    fn resize_views(&mut self) {
        let (width, height) = self.screen;
        let rows = slot_rows(height, self.displayed_count());
        let display = self.display;
        for (slot, kind) in display.iter().enumerate() {
            if let Some(kind) = kind {
                let body = rows[slot].saturating_sub(1) as usize;
                self.view_mut(*kind).set_size(width as usize, body);
            }
        }
    }

    // ── Status ──

    pub fn notify(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
        self.status_ticks = 0;
    }

    fn clear_status(&mut self) {
        self.status_message = None;
        self.status_ticks = 0;
    }

    /// Called once per idle loop iteration; clears stale status messages.
    pub fn tick(&mut self) {
        if self.status_message.is_some() {
            self.status_ticks += 1;
            if self.status_ticks > STATUS_TICKS {
                self.clear_status();
            }
        }
    }
}
