//! Picking one item out of an enumerated listing
//!
//! Zero items is an error, one item is taken without asking, and anything
//! more goes to a [`Prompter`].

use crate::error::{Result, VaultScoutError};
use dialoguer::{Select, theme::ColorfulTheme};
use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

/// Something that can be offered in a selection list
pub trait Choice {
    /// Identifier returned once the item is chosen
    fn id(&self) -> &str;

    /// Line shown to the operator
    fn label(&self) -> &str;
}

/// Asks the operator to pick one of several labels
pub trait Prompter {
    /// Returns an index into `labels`
    fn choose(&mut self, heading: &str, labels: &[&str]) -> Result<usize>;
}

/// Resolve `items` to a single one. `kind` names the items in messages
/// ("subscription").
pub fn resolve<'a, T: Choice, P: Prompter + ?Sized>(
    kind: &str,
    items: &'a [T],
    prompter: &mut P,
) -> Result<&'a T> {
    match items {
        [] => Err(VaultScoutError::EmptyResult(format!(
            "No {}s found for this user in this tenant.",
            kind
        ))),
        [only] => {
            tracing::debug!("Only one {} available: {}", kind, only.id());
            Ok(only)
        }
        many => {
            let labels: Vec<&str> = many.iter().map(Choice::label).collect();
            let index = prompter.choose(&format!("Please select a {}:", kind), &labels)?;
            many.get(index).ok_or(VaultScoutError::SelectionAborted)
        }
    }
}

/// Plain numbered list on a writer, bare integer read from a reader
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompter<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn choose(&mut self, heading: &str, labels: &[&str]) -> Result<usize> {
        writeln!(self.output, "{}", heading)?;
        for (index, label) in labels.iter().enumerate() {
            writeln!(self.output, "\t{:2}) {}", index, label)?;
        }

        loop {
            write!(self.output, "Selection: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Err(VaultScoutError::SelectionAborted);
            }

            match line.trim().parse::<usize>() {
                Ok(index) if index < labels.len() => return Ok(index),
                _ => writeln!(
                    self.output,
                    "Enter a number between 0 and {}.",
                    labels.len().saturating_sub(1)
                )?,
            }
        }
    }
}

/// Arrow-key picker for interactive terminals
#[derive(Debug, Default)]
pub struct PickerPrompter;

impl Prompter for PickerPrompter {
    fn choose(&mut self, heading: &str, labels: &[&str]) -> Result<usize> {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(heading.trim_end_matches(':'))
            .items(labels)
            .default(0)
            .interact_opt()?;
        selection.ok_or(VaultScoutError::SelectionAborted)
    }
}
