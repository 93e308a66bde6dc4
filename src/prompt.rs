use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Asks the user before destructive operations and reports outcomes.
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send;

    /// Fire-and-forget.
    fn notify(&self, message: &str, kind: NoticeKind);
}

impl<P: Prompter> Prompter for Arc<P> {
    fn confirm(&self, message: &str) -> impl Future<Output = bool> + Send {
        (**self).confirm(message)
    }

    fn notify(&self, message: &str, kind: NoticeKind) {
        (**self).notify(message, kind)
    }
}

/// Prompts on stdin/stdout. With `assume_yes` every confirmation is granted
/// without asking.
pub struct TerminalPrompter {
    pub assume_yes: bool,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> Self {
        TerminalPrompter { assume_yes }
    }
}

impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            tracing::info!(prompt = message, "confirmation assumed");
            return true;
        }

        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            print!("{message} [y/N] ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read confirmation, treating as no");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "confirmation task failed, treating as no");
                false
            }
        }
    }

    fn notify(&self, message: &str, kind: NoticeKind) {
        match kind {
            NoticeKind::Error => {
                tracing::error!(notice = message);
                eprintln!("{message}");
            }
            NoticeKind::Success => {
                tracing::info!(notice = message);
                println!("{message}");
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
