//! Interactive prompts for values not given on the command line.

use anyhow::{Context, Result};
use gandi_core::GandiError;
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Text};

/// Validation hook for text answers
pub type TextCheck = fn(&str) -> std::result::Result<(), String>;

/// Validation hook for numeric answers
pub type NumberCheck = fn(i64) -> std::result::Result<(), String>;

/// Source of answers for missing values
pub trait Prompter {
    /// Ask for a line of text
    fn text(&self, message: &str, default: Option<&str>, check: Option<TextCheck>)
        -> Result<String>;

    /// Ask for an integer
    fn number(&self, message: &str, default: Option<i64>, check: Option<NumberCheck>)
        -> Result<i64>;

    /// Ask for a secret; input is masked
    fn secret(&self, message: &str, check: Option<TextCheck>) -> Result<String>;

    /// Ask a yes/no question
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Terminal prompts
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

fn to_validation(outcome: std::result::Result<(), String>) -> Validation {
    match outcome {
        Ok(()) => Validation::Valid,
        Err(message) => Validation::Invalid(message.into()),
    }
}

impl Prompter for InquirePrompter {
    fn text(
        &self,
        message: &str,
        default: Option<&str>,
        check: Option<TextCheck>,
    ) -> Result<String> {
        let mut prompt = Text::new(message);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        if let Some(check) = check {
            prompt = prompt.with_validator(move |answer: &str| Ok(to_validation(check(answer))));
        }
        prompt
            .prompt()
            .with_context(|| format!("Failed to read answer to '{}'", message))
    }

    fn number(
        &self,
        message: &str,
        default: Option<i64>,
        check: Option<NumberCheck>,
    ) -> Result<i64> {
        let mut prompt =
            CustomType::<i64>::new(message).with_error_message("Please type a whole number");
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        if let Some(check) = check {
            prompt = prompt.with_validator(move |answer: &i64| Ok(to_validation(check(*answer))));
        }
        prompt
            .prompt()
            .with_context(|| format!("Failed to read answer to '{}'", message))
    }

    fn secret(&self, message: &str, check: Option<TextCheck>) -> Result<String> {
        let mut prompt = Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked);
        if let Some(check) = check {
            prompt = prompt.with_validator(move |answer: &str| Ok(to_validation(check(answer))));
        }
        prompt
            .prompt()
            .with_context(|| format!("Failed to read answer to '{}'", message))
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        Confirm::new(message)
            .with_default(false)
            .prompt()
            .with_context(|| format!("Failed to read answer to '{}'", message))
    }
}

/// Prompter for unattended runs: every question is a missing value.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn text(&self, message: &str, _: Option<&str>, _: Option<TextCheck>) -> Result<String> {
        Err(GandiError::MissingValue(message.trim_end_matches([':', ' ']).to_string()).into())
    }

    fn number(&self, message: &str, _: Option<i64>, _: Option<NumberCheck>) -> Result<i64> {
        Err(GandiError::MissingValue(message.trim_end_matches([':', ' ']).to_string()).into())
    }

    fn secret(&self, message: &str, _: Option<TextCheck>) -> Result<String> {
        Err(GandiError::MissingValue(message.trim_end_matches([':', ' ']).to_string()).into())
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        Err(GandiError::MissingValue(format!("confirmation for '{}'", message)).into())
    }
}
