use crate::ethereum::ChainId;
use std::{
    fmt,
    io::{self, BufRead, Write},
};

/// What the user is about to authorize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Deploy,
    Call,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Deploy => write!(f, "Deploy"),
            Action::Call => write!(f, "Call"),
        }
    }
}

/// Last chance to abort before a transaction is signed.
pub trait Confirm: Send + Sync {
    fn confirm(&self, action: Action, chain_name: &str, chain_id: ChainId) -> bool;
}

/// Asks on stdin; anything other than an answer starting with `y` declines.
#[derive(Clone, Copy, Debug, Default)]
pub struct Prompt;

impl Confirm for Prompt {
    fn confirm(&self, action: Action, chain_name: &str, chain_id: ChainId) -> bool {
        let mut stdout = io::stdout();
        if write!(stdout, "{} ", prompt_text(action, chain_name, chain_id))
            .and_then(|_| stdout.flush())
            .is_err()
        {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => answer_is_yes(&answer),
            Err(e) => {
                tracing::warn!("failed to read answer: {}", e);
                false
            }
        }
    }
}

/// Never asks.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, action: Action, chain_name: &str, chain_id: ChainId) -> bool {
        tracing::debug!(
            "auto-confirmed: {}",
            prompt_text(action, chain_name, chain_id)
        );
        true
    }
}

pub fn prompt_text(action: Action, chain_name: &str, chain_id: ChainId) -> String {
    format!(
        "? Confirm to {} the contract on {}(chainID = {})? [y/N]",
        action, chain_name, chain_id
    )
}

pub fn answer_is_yes(answer: &str) -> bool {
    matches!(answer.trim_start().chars().next(), Some('y') | Some('Y'))
}
