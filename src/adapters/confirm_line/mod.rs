// Line-based confirmation adapter - yes/no prompts on a shared line reader

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncWriteExt, Lines};
use tokio::sync::Mutex;
use tracing::debug;

use crate::ports::*;

/// Line source shared between the interactive loop and the prompt
pub type SharedLines<R> = Arc<Mutex<Lines<R>>>;

/// Asks on stdout and reads the answer from the shared line source
pub struct LineConfirmAdapter<R> {
    lines: SharedLines<R>,
}

impl<R> LineConfirmAdapter<R> {
    pub fn new(lines: SharedLines<R>) -> Self {
        Self { lines }
    }
}

/// Only an explicit yes counts; empty input takes the default (no)
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl<R> ConfirmPort for LineConfirmAdapter<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn confirm(&self, prompt: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        let question = format!("{} [y/N] ", prompt);
        if stdout.write_all(question.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(answer)) => is_affirmative(&answer),
            Ok(None) => false,
            Err(e) => {
                debug!("Confirmation input failed: {}", e);
                false
            }
        }
    }
}
