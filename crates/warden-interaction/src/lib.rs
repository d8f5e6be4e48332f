//! Operator-facing interaction.
//!
//! The only interactive surface of the agent is the guard-code prompt: when
//! the network demands a second factor mid-login, the operator types it at
//! the terminal. The login sequence stays suspended until then, so the
//! prompt deliberately has no timeout.

use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;
use warden_core::error::{Result, WardenError};
use warden_core::guard::GuardCodePrompt;
use warden_types::GuardCode;

/// Reads a guard code from the terminal with a rustyline editor.
#[derive(Debug, Default)]
pub struct TerminalGuardPrompt;

impl TerminalGuardPrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GuardCodePrompt for TerminalGuardPrompt {
    async fn request_code(&self, hint: Option<&str>) -> Result<GuardCode> {
        let hint = hint.map(str::to_owned);
        debug!("requesting a guard code from the operator");
        // rustyline blocks the calling thread, keep it off the runtime
        tokio::task::spawn_blocking(move || prompt_blocking(hint.as_deref()))
            .await
            .map_err(|err| WardenError::prompt(format!("prompt task failed: {err}")))?
    }
}

fn prompt_blocking(hint: Option<&str>) -> Result<GuardCode> {
    match hint {
        Some(domain) => println!(
            "{}",
            format!("A guard code was sent to your {domain} e-mail address.").bright_yellow()
        ),
        None => println!(
            "{}",
            "Enter the code from your mobile authenticator.".bright_yellow()
        ),
    }

    let mut editor = DefaultEditor::new()
        .map_err(|err| WardenError::prompt(format!("cannot open the terminal: {err}")))?;

    loop {
        match editor.readline("Guard code: ") {
            Ok(line) => {
                let code = line.trim();
                if code.is_empty() {
                    println!("{}", "The guard code cannot be empty.".yellow());
                    continue;
                }
                return Ok(GuardCode::new(code));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return Err(WardenError::prompt("guard code entry was cancelled"));
            }
            Err(err) => {
                return Err(WardenError::prompt(format!(
                    "failed to read the guard code: {err}"
                )));
            }
        }
    }
}
