//! Line commands read from stdin.

use shared::domain::{DraftField, UnknownDraftField};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { field: DraftField, value: String },
    Submit,
    List,
    Draft,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("usage: set <field> <value>")]
    MissingField,
    #[error(transparent)]
    UnknownField(#[from] UnknownDraftField),
}

pub const HELP: &str = "\
commands:
  set <name|description|speakerName|speakerBio> <value>
  submit
  list
  draft
  help
  quit";

/// Parses one input line. The value of `set` is everything after the field
/// name, so it may contain spaces; it may also be empty.
pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (line, ""),
    };

    match head {
        "" => Err(CommandError::Empty),
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim_start()),
                None => (rest, ""),
            };
            if field.is_empty() {
                return Err(CommandError::MissingField);
            }
            let field = field.parse::<DraftField>()?;
            Ok(Command::Set {
                field,
                value: value.to_string(),
            })
        }
        "submit" => Ok(Command::Submit),
        "list" | "ls" => Ok(Command::List),
        "draft" => Ok(Command::Draft),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
