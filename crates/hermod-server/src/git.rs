//! Local git repository tools.
//!
//! [`GitCli`] shells out to the `git` binary inside the configured
//! repository. When no repository is configured every operation fails with
//! [`ToolError::GitNotConfigured`], which callers surface as a tool error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ToolError, ToolResult};

pub const DEFAULT_LOG_LIMIT: u32 = 30;
pub const MAX_LOG_LIMIT: u32 = 1000;

const LOG_FORMAT: &str = "--pretty=format:%H|%s|%an|%ad";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub branch: String,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub last_commit: Option<String>,
    pub last_commit_message: Option<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub current: bool,
    pub last_commit: Option<String>,
    pub last_commit_message: Option<String>,
}

/// Read-only access to a local repository.
#[async_trait]
pub trait LocalGit: Send + Sync {
    async fn status(&self) -> ToolResult<GitStatus>;

    /// Up to `limit` commits, newest first.
    async fn log(&self, limit: u32, branch: Option<&str>) -> ToolResult<Vec<CommitInfo>>;

    async fn branches(&self) -> ToolResult<Vec<BranchInfo>>;

    /// Unified diff of the working tree, or of the index when `staged`.
    async fn diff(&self, file_path: Option<&str>, staged: bool) -> ToolResult<String>;
}

/// Requested log size, defaulted and clamped to `[1, 1000]`.
pub fn clamp_limit(requested: Option<i64>) -> u32 {
    requested
        .map(|n| n.clamp(1, MAX_LOG_LIMIT as i64) as u32)
        .unwrap_or(DEFAULT_LOG_LIMIT)
}

// ─────────────────────────────────────────────────────────────────────────────
// git CLI
// ─────────────────────────────────────────────────────────────────────────────

/// [`LocalGit`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: Option<PathBuf>,
}

impl GitCli {
    pub fn new(repo: Option<PathBuf>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> Option<&Path> {
        self.repo.as_deref()
    }

    fn repo_dir(&self) -> ToolResult<&Path> {
        let dir = self.repo.as_deref().ok_or(ToolError::GitNotConfigured)?;
        if !dir.is_dir() {
            return Err(ToolError::GitRepoMissing(dir.to_path_buf()));
        }
        Ok(dir)
    }

    /// Run git and return stdout when the exit code is in `accepted`.
    async fn run_accepting(&self, args: &[&str], accepted: &[i32]) -> ToolResult<String> {
        let dir = self.repo_dir()?;
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(ToolError::GitSpawn)?;

        let code = output.status.code().unwrap_or(-1);
        if accepted.contains(&code) {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let command = args.join(" ");
        tracing::warn!(%command, code, "git command failed");
        Err(ToolError::GitCommand {
            command,
            code,
            output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn run(&self, args: &[&str]) -> ToolResult<String> {
        self.run_accepting(args, &[0]).await
    }

    async fn current_branch(&self) -> ToolResult<String> {
        Ok(self
            .run(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await?
            .trim()
            .to_string())
    }

    /// Short sha and subject of the tip of `rev`. None for an unborn branch.
    async fn tip(&self, rev: &str) -> (Option<String>, Option<String>) {
        match self.run(&["log", "-1", "--pretty=format:%h|%s", rev]).await {
            Ok(line) => match line.trim().split_once('|') {
                Some((sha, subject)) => (Some(sha.to_string()), Some(subject.to_string())),
                None => (None, None),
            },
            Err(_) => (None, None),
        }
    }
}

#[async_trait]
impl LocalGit for GitCli {
    async fn status(&self) -> ToolResult<GitStatus> {
        let branch = self.current_branch().await?;
        let porcelain = self.run(&["status", "--porcelain"]).await?;
        let (last_commit, last_commit_message) = self.tip("HEAD").await;

        let mut status = parse_porcelain(&porcelain);
        status.branch = branch;
        status.last_commit = last_commit;
        status.last_commit_message = last_commit_message;
        Ok(status)
    }

    async fn log(&self, limit: u32, branch: Option<&str>) -> ToolResult<Vec<CommitInfo>> {
        let limit = limit.clamp(1, MAX_LOG_LIMIT).to_string();
        let mut args = vec!["log", LOG_FORMAT, "--date=iso", "-n", limit.as_str()];
        if let Some(branch) = branch {
            args.push(branch);
            args.push("--");
        }
        let output = self.run(&args).await?;
        Ok(parse_log(&output))
    }

    async fn branches(&self) -> ToolResult<Vec<BranchInfo>> {
        let current = self.current_branch().await?;
        let listing = self.run(&["branch", "--format=%(refname:short)"]).await?;

        let mut branches = Vec::new();
        for name in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (last_commit, last_commit_message) = self.tip(name).await;
            branches.push(BranchInfo {
                name: name.to_string(),
                current: name == current,
                last_commit,
                last_commit_message,
            });
        }
        Ok(branches)
    }

    async fn diff(&self, file_path: Option<&str>, staged: bool) -> ToolResult<String> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--cached");
        }
        if let Some(path) = file_path {
            args.push("--");
            args.push(path);
        }
        // exit code 1 means "differences found"
        self.run_accepting(&args, &[0, 1]).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Classify `git status --porcelain` (v1) lines.
pub fn parse_porcelain(output: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in output.lines().filter(|l| l.len() > 3) {
        let mut codes = line.chars();
        let (Some(index), Some(worktree)) = (codes.next(), codes.next()) else {
            continue;
        };
        let path = line[3..].trim().to_string();

        if index == '?' && worktree == '?' {
            status.untracked.push(path);
            continue;
        }
        if index != ' ' {
            status.staged.push(path.clone());
        }
        if worktree != ' ' {
            status.modified.push(path);
        }
    }
    status
}

/// Parse `%H|%s|%an|%ad` lines. The subject may itself contain `|`.
pub fn parse_log(output: &str) -> Vec<CommitInfo> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let (sha, rest) = line.split_once('|')?;
            let mut tail = rest.rsplitn(3, '|');
            let date = tail.next()?;
            let author = tail.next()?;
            let message = tail.next()?;
            Some(CommitInfo {
                sha: sha.chars().take(7).collect(),
                message: message.to_string(),
                author: author.to_string(),
                date: date.to_string(),
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────────────────

pub fn format_status(status: &GitStatus) -> String {
    let mut out = format!("Branch: {}", status.branch);
    if let (Some(sha), Some(message)) = (&status.last_commit, &status.last_commit_message) {
        out.push_str(&format!("\nLast commit: {} {}", sha, message));
    }
    if status.is_clean() {
        out.push_str("\nWorking tree clean");
        return out;
    }
    for (label, files) in [
        ("Staged", &status.staged),
        ("Modified", &status.modified),
        ("Untracked", &status.untracked),
    ] {
        if !files.is_empty() {
            out.push_str(&format!("\n{} ({}):", label, files.len()));
            for f in files {
                out.push_str(&format!("\n  {}", f));
            }
        }
    }
    out
}

pub fn format_log(commits: &[CommitInfo]) -> String {
    if commits.is_empty() {
        return "No commits found".to_string();
    }
    let lines: Vec<String> = commits
        .iter()
        .map(|c| format!("{} {} ({}, {})", c.sha, c.message, c.author, c.date))
        .collect();
    format!("{} commits:\n{}", commits.len(), lines.join("\n"))
}

pub fn format_branches(branches: &[BranchInfo]) -> String {
    if branches.is_empty() {
        return "No branches found".to_string();
    }
    branches
        .iter()
        .map(|b| {
            let marker = if b.current { "*" } else { " " };
            match (&b.last_commit, &b.last_commit_message) {
                (Some(sha), Some(message)) => format!("{} {} ({} {})", marker, b.name, sha, message),
                _ => format!("{} {}", marker, b.name),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_diff(diff: &str) -> String {
    if diff.trim().is_empty() {
        "No changes".to_string()
    } else {
        diff.to_string()
    }
}
