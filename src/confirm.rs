//! The confirmation gate in front of every live transfer.

use anyhow::Result;
use dialoguer::Input;

/// Answer source for the transfer prompt.
pub trait Prompt {
    /// Ask `question` and return the raw answer.
    fn ask(&self, question: &str) -> Result<String>;
}

/// Interactive prompt on the terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask(&self, question: &str) -> Result<String> {
        println!();
        let answer: String = Input::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }
}

/// Only an explicit "yes" proceeds. "y", "ok" and empty input do not.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Question shown before transferring `folder`
pub fn transfer_question(folder: &str) -> String {
    format!("Do you want to proceed with the actual transfer of '{folder}'? (yes/no)")
}
