use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the user asked for, independent of the key that was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    // View switching
    ViewMain,
    ViewDiff,
    ViewLog,
    ViewHelp,
    ViewPager,

    // View manipulation
    Enter,
    SwitchView,
    ViewClose,
    Next,
    Previous,

    // Cursor navigation
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveFirstLine,
    MoveLastLine,

    // Scrolling
    ScrollLineUp,
    ScrollLineDown,

    // Misc
    ShowVersion,
    ScreenRedraw,
    Quit,
    QuitAll,
}

/// A key binding with the text shown for it in the help view
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub request: Request,
    pub help: &'static str,
}

const fn key(code: KeyCode, request: Request, help: &'static str) -> KeyBinding {
    KeyBinding {
        code,
        modifiers: KeyModifiers::NONE,
        request,
        help,
    }
}

const fn ctrl(c: char, request: Request, help: &'static str) -> KeyBinding {
    KeyBinding {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::CONTROL,
        request,
        help,
    }
}

/// Default key map
pub const KEYMAP: &[KeyBinding] = &[
    key(KeyCode::Char('m'), Request::ViewMain, "Show main view"),
    key(KeyCode::Char('d'), Request::ViewDiff, "Show diff view"),
    key(KeyCode::Char('l'), Request::ViewLog, "Show log view"),
    key(KeyCode::Char('p'), Request::ViewPager, "Show pager view"),
    key(KeyCode::Char('h'), Request::ViewHelp, "Show help page"),
    key(KeyCode::Enter, Request::Enter, "Open selected commit / walk the log"),
    key(KeyCode::Tab, Request::SwitchView, "Switch to next view"),
    key(KeyCode::Char('q'), Request::ViewClose, "Close view, quit if it is the last"),
    key(KeyCode::Char('Q'), Request::Quit, "Quit"),
    ctrl('c', Request::QuitAll, "Quit all views"),
    key(KeyCode::Up, Request::Previous, "Previous line (moves the parent of a split diff)"),
    key(KeyCode::Down, Request::Next, "Next line (moves the parent of a split diff)"),
    key(KeyCode::Char('k'), Request::MoveUp, "Move cursor one line up"),
    key(KeyCode::Char('j'), Request::MoveDown, "Move cursor one line down"),
    key(KeyCode::PageUp, Request::MovePageUp, "Move cursor one page up"),
    key(KeyCode::Char('b'), Request::MovePageUp, "Move cursor one page up"),
    key(KeyCode::Char('-'), Request::MovePageUp, "Move cursor one page up"),
    key(KeyCode::PageDown, Request::MovePageDown, "Move cursor one page down"),
    key(KeyCode::Char(' '), Request::MovePageDown, "Move cursor one page down"),
    key(KeyCode::Home, Request::MoveFirstLine, "Move cursor to first line"),
    key(KeyCode::End, Request::MoveLastLine, "Move cursor to last line"),
    key(KeyCode::Insert, Request::ScrollLineUp, "Scroll view one line up"),
    ctrl('y', Request::ScrollLineUp, "Scroll view one line up"),
    key(KeyCode::Delete, Request::ScrollLineDown, "Scroll view one line down"),
    ctrl('e', Request::ScrollLineDown, "Scroll view one line down"),
    key(KeyCode::Char('v'), Request::ShowVersion, "Show version"),
    ctrl('l', Request::ScreenRedraw, "Redraw screen"),
];

/// Map a key press to a request using [`KEYMAP`].
pub fn request_for_key(event: &KeyEvent) -> Option<Request> {
    // Shifted letters arrive as uppercase chars; SHIFT itself is not part of the binding.
    let modifiers = event.modifiers - KeyModifiers::SHIFT;
    KEYMAP
        .iter()
        .find(|b| b.code == event.code && b.modifiers == modifiers)
        .map(|b| b.request)
}

fn key_label(binding: &KeyBinding) -> String {
    let base = match binding.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::PageUp => "PgUp".into(),
        KeyCode::PageDown => "PgDown".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::Insert => "Insert".into(),
        KeyCode::Delete => "Delete".into(),
        other => format!("{:?}", other),
    };
    if binding.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl-{}", base.to_uppercase())
    } else {
        base
    }
}

/// Text of the help view.
pub fn help_text() -> String {
    let mut text = String::from("Quick reference for tigr keys:\n\n");
    for binding in KEYMAP {
        text.push_str(&format!("    {:<10} {}\n", key_label(binding), binding.help));
    }
    text
}
