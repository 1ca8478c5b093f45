//! User prompt utilities for interactive confirmation

use anyhow::Result;
use dialoguer::Confirm;

/// Ask user for yes/no confirmation; destructive commands default to no
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(result)
}
