mod app;
mod config;
mod git;
mod ui;

use anyhow::{Context, Result};
use app::{request_for_key, App, ViewKind};
use clap::Parser;
use config::Config;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use git::{join_command, ShellRunner, Stream};
use ratatui::prelude::*;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Once;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;

/// Command the main view runs when git options are given on the command line
const MAIN_PREFIX: &str = "git log --topo-order --stat --pretty=raw";

/// Event poll timeout while some view is still loading
const LOADING_POLL: Duration = Duration::from_millis(10);
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Text-mode browser for git repositories
#[derive(Parser, Debug)]
#[command(
    name = "tigr",
    about,
    disable_version_flag = true,
    override_usage = "tigr [options] [--] [git log options]\n       \
                      tigr [options] log  [git log options]\n       \
                      tigr [options] diff [git diff options]\n       \
                      tigr [options] show [git show options]\n       \
                      tigr [options] <    [git command output]"
)]
struct Cli {
    /// Start up in log view
    #[arg(short = 'l', conflicts_with = "diff")]
    log: bool,

    /// Start up in diff view
    #[arg(short = 'd')]
    diff: bool,

    /// Prefix line numbers in pager views every I lines
    #[arg(
        short = 'n',
        long = "line-number",
        value_name = "I",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "5"
    )]
    line_number: Option<usize>,

    /// Number of spaces a tab expands to
    #[arg(short = 't', long = "tab-size", value_name = "N")]
    tab_size: Option<usize>,

    /// Show version and quit
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// `log`, `diff` or `show` followed by git options, or git log options
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "GIT ARGS")]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.version {
        println!("tigr version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let _log_guard = configure_logging();
    install_panic_hook();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(target: "runtime", %err, "fatal");
            eprintln!("tigr: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let piped = !io::stdin().is_terminal();

    let props = git::read_repo_config()?;
    let repo_root = match git::get_repo_root() {
        Ok(root) => Some(root),
        Err(_) if piped => None,
        Err(err) => return Err(err),
    };

    let mut config = config::load_config(repo_root.as_deref());
    config.apply_repo_properties(&props);
    config.apply_env(|name| std::env::var(name).ok());
    let start = apply_cli(&cli, &mut config, piped);

    let refs = match &repo_root {
        Some(_) => git::RefStore::parse(&git::run_listing(&config.commands.refs)?),
        None => git::RefStore::default(),
    };
    tracing::info!(target: "runtime", refs = refs.len(), view = start.name(), "startup");

    let pager_input = piped.then(|| Stream {
        reader: Box::new(io::stdin()),
        child: None,
    });
    let runner = ShellRunner { cwd: repo_root };
    let mut app = App::new(config, refs, Box::new(runner), pager_input);

    // Terminal setup
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.resize(size.width, size.height);
    app.open_view(start, app::OpenFlags::DEFAULT);

    let result = run_app(&mut terminal, &mut app);

    // Cleanup
    restore_terminal();
    terminal.show_cursor()?;

    result
}

/// Fold command line options into the config and pick the first view.
fn apply_cli(cli: &Cli, config: &mut Config, piped: bool) -> ViewKind {
    if let Some(interval) = cli.line_number {
        config.display.line_number = interval;
    }
    if let Some(tab_size) = cli.tab_size {
        config.display.tab_size = tab_size;
    }
    if piped {
        return ViewKind::Pager;
    }

    match cli.args.split_first() {
        Some((sub, rest)) if sub == "log" => {
            config.commands.log = join_command("git log", rest);
            ViewKind::Log
        }
        Some((sub, rest)) if sub == "diff" => {
            config.commands.diff = join_command("git diff", rest);
            ViewKind::Diff
        }
        Some((sub, rest)) if sub == "show" => {
            config.commands.diff = join_command("git show", rest);
            ViewKind::Diff
        }
        Some(_) => {
            config.commands.main = join_command(MAIN_PREFIX, &cli.args);
            ViewKind::Main
        }
        None if cli.log => ViewKind::Log,
        None if cli.diff => ViewKind::Diff,
        None => ViewKind::Main,
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update_views();

        if app.needs_clear {
            terminal.clear()?;
            app.needs_clear = false;
        }
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = if app.is_loading() { LOADING_POLL } else { IDLE_POLL };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(request) = request_for_key(&key) {
                        tracing::trace!(target: "input", ?request, "dispatch");
                        app.dispatch(request);
                    }
                }
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        } else if !app.is_loading() {
            // Idle tick: clears stale status messages
            app.tick();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = config::log_dir().ok()?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "tigr.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            restore_terminal();
            default_panic(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tigr").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn no_arguments_start_in_main() {
        let mut config = Config::default();
        assert_eq!(apply_cli(&parse(&[]), &mut config, false), ViewKind::Main);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn flags_pick_start_view() {
        let mut config = Config::default();
        assert_eq!(apply_cli(&parse(&["-l"]), &mut config, false), ViewKind::Log);
        assert_eq!(apply_cli(&parse(&["-d"]), &mut config, false), ViewKind::Diff);
    }

    #[test]
    fn subcommand_replaces_its_template() {
        let mut config = Config::default();
        let start = apply_cli(&parse(&["show", "--stat", "v1.0"]), &mut config, false);
        assert_eq!(start, ViewKind::Diff);
        assert_eq!(config.commands.diff, "git show --stat v1.0");

        let start = apply_cli(&parse(&["log", "--grep", "two words"]), &mut config, false);
        assert_eq!(start, ViewKind::Log);
        assert_eq!(config.commands.log, "git log --grep 'two words'");
    }

    #[test]
    fn plain_git_options_go_to_main() {
        let mut config = Config::default();
        let start = apply_cli(&parse(&["--", "--all"]), &mut config, false);
        assert_eq!(start, ViewKind::Main);
        assert_eq!(config.commands.main, format!("{} --all", MAIN_PREFIX));
    }

    #[test]
    fn line_number_defaults_to_every_fifth_line() {
        let mut config = Config::default();
        apply_cli(&parse(&["-n"]), &mut config, false);
        assert_eq!(config.display.line_number, 5);
        apply_cli(&parse(&["--line-number=3", "-t", "4"]), &mut config, false);
        assert_eq!(config.display.line_number, 3);
        assert_eq!(config.display.tab_size, 4);
    }

    #[test]
    fn piped_input_starts_pager() {
        let mut config = Config::default();
        assert_eq!(apply_cli(&parse(&["log"]), &mut config, true), ViewKind::Pager);
        assert_eq!(config.commands, Config::default().commands);
    }
}
