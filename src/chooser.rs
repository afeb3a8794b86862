use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use dialoguer::{Confirm, Input};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Human in the loop: picks lines, types queries, confirms actions
#[async_trait]
pub trait Chooser: Send + Sync {
    /// Let the user pick one line; `None` when nothing was chosen
    async fn choose(&self, lines: &[String]) -> Result<Option<String>>;

    /// Ask for free text; `None` when the answer is blank
    async fn prompt(&self, message: &str) -> Result<Option<String>>;

    /// Yes/no question, defaulting to no
    async fn confirm(&self, message: &str) -> Result<bool>;
}

/// Chooser backed by `fzf` for picking and dialoguer for prompts
pub struct FzfChooser {
    binary: String,
}

impl FzfChooser {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Default for FzfChooser {
    fn default() -> Self {
        Self::new("fzf")
    }
}

#[async_trait]
impl Chooser for FzfChooser {
    async fn choose(&self, lines: &[String]) -> Result<Option<String>> {
        if lines.is_empty() {
            return Ok(None);
        }

        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start {}", self.binary))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("{} stdin unavailable", self.binary))?;
        stdin.write_all(lines.join("\n").as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        match output.status.code() {
            Some(0) => {
                let chosen = String::from_utf8_lossy(&output.stdout).trim().to_string();
                debug!("Chosen line: {}", chosen);
                Ok(if chosen.is_empty() { None } else { Some(chosen) })
            }
            // 1: no match, 130: interrupted with ESC or CTRL-C
            Some(1) | Some(130) => Ok(None),
            _ => Err(anyhow!("{} failed with {}", self.binary, output.status)),
        }
    }

    async fn prompt(&self, message: &str) -> Result<Option<String>> {
        let message = message.to_string();
        let answer: String = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(message)
                .allow_empty(true)
                .interact_text()
        })
        .await?
        .context("prompt failed")?;

        let trimmed = answer.trim();
        Ok(if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        })
    }

    async fn confirm(&self, message: &str) -> Result<bool> {
        let message = message.to_string();
        let confirmed = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(message).default(false).interact()
        })
        .await?
        .context("prompt failed")?;
        Ok(confirmed)
    }
}
