//! Snapshot of the user's shell environment
//!
//! The model picks better commands when it knows the shell, the OS, whether
//! privileged commands are possible and what the working directory contains.
//! Every probe is best effort: a failed probe degrades to a neutral value and
//! never aborts the request.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};
use nix::unistd::geteuid;
use sysinfo::System;
use tokio::fs;
use tokio::process::Command;

/// Number of directory entries listed
pub const MAX_LISTED_FILES: usize = 10;
/// Number of shell history lines included
pub const MAX_HISTORY_COMMANDS: usize = 10;
/// Upper bound on the sudo probe
pub const SUDO_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// A directory entry as shown to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    /// Permission bits, `mode & 0o777`
    pub mode: u32,
    pub modified: NaiveDateTime,
    pub size: u64,
}

impl FileEntry {
    fn render(&self) -> String {
        format!(
            "  {} ({:03o}, {}, {})",
            self.name,
            self.mode,
            self.modified.format("%Y-%m-%d %H:%M"),
            format_size(self.size)
        )
    }
}

/// Contents of the working directory, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileListing {
    Entries {
        files: Vec<FileEntry>,
        /// More entries existed than were kept
        truncated: bool,
    },
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    /// Basename of `$SHELL`
    pub shell: String,
    pub os: Option<String>,
    pub time: NaiveDateTime,
    pub user: Option<String>,
    pub is_root: bool,
    pub has_sudo: bool,
    pub home: Option<PathBuf>,
    pub cwd: PathBuf,
    pub files: FileListing,
    /// Most recent shell commands, oldest first
    pub recent_commands: Vec<String>,
}

impl EnvironmentSnapshot {
    /// Probes the current process environment
    pub async fn collect() -> Self {
        let env_var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home = dirs::home_dir();

        let is_root = is_root();
        let (has_sudo, files) = tokio::join!(
            has_sudo_rights(),
            list_recent_files(&cwd, MAX_LISTED_FILES)
        );

        let recent_commands = match (&home, env_var("PROMPT_COMMAND")) {
            (Some(home), Some(prompt_command)) if history_is_synced(&prompt_command) => {
                read_shell_history(&home.join(".bash_history"), MAX_HISTORY_COMMANDS).await
            }
            _ => Vec::new(),
        };

        let snapshot = Self {
            shell: shell_name(env_var("SHELL").as_deref()),
            os: os_description(),
            time: Local::now().naive_local(),
            user: env_var("USER").or_else(|| env_var("USERNAME")),
            is_root,
            has_sudo,
            home,
            cwd,
            files,
            recent_commands,
        };

        tracing::debug!(
            shell = %snapshot.shell,
            is_root = snapshot.is_root,
            has_sudo = snapshot.has_sudo,
            history_lines = snapshot.recent_commands.len(),
            "Collected environment snapshot"
        );

        snapshot
    }

    /// Renders the block placed inside `<environment>` tags
    pub fn render(&self) -> String {
        let os_line = self
            .os
            .as_ref()
            .map(|os| format!("OS: {os}\n"))
            .unwrap_or_default();
        let user_line = self
            .user
            .as_ref()
            .map(|user| format!("User: {user}"))
            .unwrap_or_default();
        let home_line = self
            .home
            .as_ref()
            .map(|home| format!("Home: {}", home.display()))
            .unwrap_or_default();

        let mut out = format!(
            "Shell: {}\n{}Current time: {}\n{}\nRoot privileges: {}\nSudo rights: {}\n{}\nCurrent directory: {}",
            self.shell,
            os_line,
            self.time.format("%Y-%m-%d %H:%M:%S"),
            user_line,
            yes_no(self.is_root),
            yes_no(self.has_sudo),
            home_line,
            self.cwd.display()
        );

        out.push_str(&format!(
            "\nFiles in the current directory ({} most recent) [name (permissions, last modified, size)]:\n",
            MAX_LISTED_FILES
        ));
        match &self.files {
            FileListing::Entries { files, truncated } => {
                let mut lines: Vec<String> = files.iter().map(FileEntry::render).collect();
                if *truncated {
                    lines.push("  ...".to_string());
                }
                out.push_str(&lines.join("\n"));
            }
            FileListing::Unavailable(reason) => {
                out.push_str(&format!("none (error: {reason})"));
            }
        }

        if !self.recent_commands.is_empty() {
            out.push_str(&format!(
                "\nLast {} commands executed by the user:\n",
                MAX_HISTORY_COMMANDS
            ));
            let commands: Vec<String> = self
                .recent_commands
                .iter()
                .map(|cmd| format!("  {cmd}"))
                .collect();
            out.push_str(&commands.join("\n"));
        }

        out
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Basename of the login shell path, empty when unknown
pub fn shell_name(shell: Option<&str>) -> String {
    shell
        .and_then(|s| Path::new(s).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Distribution name, falling back to the kernel version
pub fn os_description() -> Option<String> {
    System::long_os_version()
        .or_else(|| System::kernel_version().map(|kernel| format!("Kernel version: {kernel}")))
}

/// Whether the process runs with an effective uid of 0
pub fn is_root() -> bool {
    geteuid().is_root()
}

/// Whether `sudo` can be used without a password prompt.
///
/// Runs `sudo -n -l`; a missing binary, a failure or a probe slower than
/// [`SUDO_PROBE_TIMEOUT`] all count as no.
pub async fn has_sudo_rights() -> bool {
    let mut command = Command::new("sudo");
    command
        .args(["-n", "-l"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(SUDO_PROBE_TIMEOUT, command.status()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "sudo probe failed to start");
            false
        }
        Err(_) => {
            tracing::debug!("sudo probe timed out");
            false
        }
    }
}

/// Lists up to `limit` entries of `dir`, most recently modified first.
///
/// Entries whose metadata cannot be read are skipped. Symlinks are followed.
pub async fn list_recent_files(dir: &Path, limit: usize) -> FileListing {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) => return FileListing::Unavailable(e.to_string()),
    };

    let mut files = Vec::new();
    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => return FileListing::Unavailable(e.to_string()),
        };

        let Ok(metadata) = fs::metadata(entry.path()).await else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        files.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            mode: metadata.permissions().mode() & 0o777,
            modified: DateTime::<Local>::from(modified).naive_local(),
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified));
    let truncated = files.len() > limit;
    files.truncate(limit);

    FileListing::Entries { files, truncated }
}

/// Bash only flushes history to disk on exit unless `PROMPT_COMMAND` does it
pub fn history_is_synced(prompt_command: &str) -> bool {
    prompt_command.contains("history -a")
}

/// Returns the last `limit` commands from a bash history file.
///
/// Blank lines and `#` timestamp lines are dropped. A missing file yields no
/// commands; any other read failure is reported as a single pseudo-command.
pub async fn read_shell_history(path: &Path, limit: usize) -> Vec<String> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Shell history file does not exist");
            return Vec::new();
        }
        Err(e) => return vec![format!("Unable to read history: {e}")],
    };

    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    let skip = lines.len().saturating_sub(limit);
    lines.into_iter().skip(skip).collect()
}

/// Human-readable size in decimal units (`1 Byte`, `999 Bytes`, `1.5 kB`)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    const BASE: f64 = 1000.0;

    if bytes == 1 {
        return "1 Byte".to_string();
    }
    if bytes < 1000 {
        return format!("{bytes} Bytes");
    }

    let bytes = bytes as f64;
    let mut unit = BASE;
    for suffix in UNITS {
        unit *= BASE;
        if bytes < unit {
            return format!("{:.1} {}", BASE * bytes / unit, suffix);
        }
    }

    format!("{:.1} {}", BASE * bytes / unit, UNITS[UNITS.len() - 1])
}
