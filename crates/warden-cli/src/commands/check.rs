//! One-off visibility probe for a single profile.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use warden_core::visibility::VisibilityProbe;
use warden_infrastructure::ProfileVisibilityChecker;
use warden_types::{AccountId, CommentVisibility};

use crate::commands::load_config;

pub async fn execute(config_path: Option<PathBuf>, account: &str) -> Result<ExitCode> {
    let account: AccountId = account
        .parse()
        .with_context(|| format!("{account:?} is not a numeric account identifier"))?;
    let config = load_config(config_path)?;
    let checker = ProfileVisibilityChecker::new(config.visibility)?;

    let result = checker.check(account).await;
    match result.verdict {
        CommentVisibility::Visible => {
            println!("{}", format!("{account}: comment section visible").green());
        }
        CommentVisibility::Hidden => {
            println!("{}", format!("{account}: comment section hidden").red());
        }
        CommentVisibility::Unknown => {
            println!(
                "{}",
                format!(
                    "{account}: visibility unknown ({})",
                    result.failure.as_deref().unwrap_or("no details")
                )
                .yellow()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}
