use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use thiserror::Error;

/// Placeholder substituted with a view's reference
pub const REF_PLACEHOLDER: &str = "%s";

/// A template may reference the ref at most this many times
pub const MAX_REF_PLACEHOLDERS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("command has {0} ref placeholders, at most {MAX_REF_PLACEHOLDERS} are allowed")]
    TooManyPlaceholders(usize),
    #[error("no command configured")]
    Empty,
}

/// Substitute every `%s` in `template` with `reference`.
pub fn format_command(template: &str, reference: &str) -> Result<String, TemplateError> {
    if template.trim().is_empty() {
        return Err(TemplateError::Empty);
    }
    let count = template.matches(REF_PLACEHOLDER).count();
    if count > MAX_REF_PLACEHOLDERS {
        return Err(TemplateError::TooManyPlaceholders(count));
    }
    Ok(template.replace(REF_PLACEHOLDER, reference))
}

/// Quote an argument for `sh -c`.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+^~".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Build a command line from a program prefix and user supplied arguments.
pub fn join_command(prefix: &str, args: &[String]) -> String {
    let mut cmd = prefix.to_string();
    for arg in args {
        cmd.push(' ');
        cmd.push_str(&shell_quote(arg));
    }
    cmd
}

/// Byte stream produced by an external command.
pub struct Stream {
    pub reader: Box<dyn Read + Send>,
    /// Process to terminate when the stream is abandoned
    pub child: Option<Child>,
}

impl Stream {
    /// Stream over in-memory text (help view, tests).
    pub fn from_text(text: impl Into<String>) -> Self {
        Stream {
            reader: Box::new(std::io::Cursor::new(text.into().into_bytes())),
            child: None,
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("child", &self.child.as_ref().map(|c| c.id()))
            .finish_non_exhaustive()
    }
}

/// Starts the external commands whose output views display.
pub trait CommandRunner {
    fn spawn(&self, command: &str) -> std::io::Result<Stream>;
}

/// Runs commands through `sh -c`, reading stdout.
#[derive(Debug, Default, Clone)]
pub struct ShellRunner {
    pub cwd: Option<String>,
}

impl CommandRunner for ShellRunner {
    fn spawn(&self, command: &str) -> std::io::Result<Stream> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child has no stdout"))?;
        Ok(Stream {
            reader: Box::new(stdout),
            child: Some(child),
        })
    }
}

// ── One-shot listings ──

/// Run a listing command to completion and return its stdout.
pub fn run_listing(command: &str) -> Result<String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run '{}'", command))?;

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split `name<separator>value` lines. Lines without the separator yield an
/// empty value; lines with an empty name are skipped.
pub fn parse_properties(text: &str, separator: char) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let (name, value) = line.split_once(separator).unwrap_or((line, ""));
            if name.is_empty() {
                None
            } else {
                Some((name.to_string(), value.to_string()))
            }
        })
        .collect()
}

/// Read repository properties (`git config --list`).
pub fn read_repo_config() -> Result<Vec<(String, String)>> {
    let output = Command::new("git")
        .args(["config", "--list"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .context("Failed to load repo config")?;

    if !output.status.success() {
        anyhow::bail!("Failed to load repo config");
    }

    Ok(parse_properties(&String::from_utf8_lossy(&output.stdout), '='))
}

/// Get the repository root directory
pub fn get_repo_root() -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .stderr(Stdio::null())
        .output()
        .context("Failed to run git")?;

    if !output.status.success() {
        anyhow::bail!("Not a git repository");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
