//! Hosting page seam: user confirmations.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

/// What a panel needs from the page that hosts it.
#[async_trait]
pub trait PanelHost: Send + Sync {
    /// Ask the user a yes/no question. `true` means proceed.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers yes to everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

#[async_trait]
impl PanelHost for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Answers no to everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

#[async_trait]
impl PanelHost for NeverConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Replays queued answers and records every prompt it was shown.
///
/// Answers `false` once the queue is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl PanelHost for ScriptedHost {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        self.answers.lock().pop_front().unwrap_or(false)
    }
}
