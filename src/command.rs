//! Textual commands driving the modifier stack.
//!
//! ```text
//! add <name>                     append a default modifier (name may contain spaces)
//! delete <id>                    remove every modifier with that id
//! update <id> <key> <json>       set one config value
//! replace <json-array>           replace the whole stack
//! switch <i> <j>                 swap two positions
//! undo | redo
//! ```

use std::str::FromStr;

use crate::catalog::EffectKind;
use crate::modifier::{ConfigValue, ModifierId, ModifierStack};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("unknown action \"{0}\"")]
    UnknownAction(String),
    #[error("unknown modifier \"{0}\"")]
    UnknownModifier(String),
    #[error("no modifier with id {0}")]
    UnknownElement(ModifierId),
    #[error("unknown property \"{key}\" referenced on {id}")]
    UnknownProperty { id: ModifierId, key: String },
    #[error("invalid json payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid index \"{0}\"")]
    InvalidIndex(String),
    #[error("index {index} is out of range for a stack of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { kind: EffectKind },
    Delete { id: ModifierId },
    Update {
        id: ModifierId,
        key: String,
        value: ConfigValue,
    },
    Replace { stack: ModifierStack },
    Switch { first: usize, second: usize },
    Undo,
    Redo,
}

impl Command {
    /// Whether the command edits the stack, as opposed to navigating history.
    pub fn is_edit(&self) -> bool {
        !matches!(self, Command::Undo | Command::Redo)
    }

    /// Applies an edit to `stack`. History commands leave it unchanged.
    pub fn apply_to(&self, stack: &mut ModifierStack) -> Result<(), CommandError> {
        match self {
            Command::Add { kind } => {
                stack.add(*kind);
            }
            Command::Delete { id } => {
                stack.delete(id);
            }
            Command::Update { id, key, value } => stack.update(id, key, value.clone())?,
            Command::Replace { stack: replacement } => stack.replace(replacement.clone()),
            Command::Switch { first, second } => stack.switch(*first, *second)?,
            Command::Undo | Command::Redo => {}
        }
        Ok(())
    }
}

/// Splits off the first whitespace-delimited token.
fn next_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (input, ""),
    }
}

fn required_token<'s>(
    input: &'s str,
    name: &'static str,
) -> Result<(&'s str, &'s str), CommandError> {
    let (token, rest) = next_token(input);
    if token.is_empty() {
        return Err(CommandError::MissingArgument(name));
    }
    Ok((token, rest))
}

fn parse_index(token: &str) -> Result<usize, CommandError> {
    token
        .parse()
        .map_err(|_| CommandError::InvalidIndex(token.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (action, rest) = required_token(line, "action")?;

        match action.to_ascii_lowercase().as_str() {
            "add" => {
                let name = rest.trim();
                if name.is_empty() {
                    return Err(CommandError::MissingArgument("name"));
                }
                let kind = EffectKind::from_name(name)
                    .filter(|kind| kind.in_catalog())
                    .ok_or_else(|| CommandError::UnknownModifier(name.to_string()))?;
                Ok(Command::Add { kind })
            }
            "delete" => {
                let (id, _) = required_token(rest, "id")?;
                Ok(Command::Delete { id: id.into() })
            }
            "update" => {
                let (id, rest) = required_token(rest, "id")?;
                let (key, rest) = required_token(rest, "key")?;
                let payload = rest.trim();
                if payload.is_empty() {
                    return Err(CommandError::MissingArgument("value"));
                }
                Ok(Command::Update {
                    id: id.into(),
                    key: key.to_string(),
                    value: serde_json::from_str(payload)?,
                })
            }
            "replace" => {
                let payload = rest.trim();
                if payload.is_empty() {
                    return Err(CommandError::MissingArgument("stack"));
                }
                Ok(Command::Replace {
                    stack: serde_json::from_str(payload)?,
                })
            }
            "switch" => {
                let (first, rest) = required_token(rest, "first index")?;
                let (second, _) = required_token(rest, "second index")?;
                Ok(Command::Switch {
                    first: parse_index(first)?,
                    second: parse_index(second)?,
                })
            }
            "undo" => Ok(Command::Undo),
            "redo" => Ok(Command::Redo),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_keyword_is_case_insensitive() {
        assert_eq!("UNDO".parse::<Command>().unwrap(), Command::Undo);
        assert_eq!("Redo".parse::<Command>().unwrap(), Command::Redo);
        assert_eq!(
            "ADD sepia".parse::<Command>().unwrap(),
            Command::Add {
                kind: EffectKind::Sepia
            }
        );
    }

    #[test]
    fn add_accepts_multi_word_names() {
        assert_eq!(
            "add Tilt Shift Blur".parse::<Command>().unwrap(),
            Command::Add {
                kind: EffectKind::TiltShiftBlur
            }
        );
    }

    #[test]
    fn add_rejects_unknown_and_library_only_names() {
        assert!(matches!(
            "add Posterize".parse::<Command>(),
            Err(CommandError::UnknownModifier(name)) if name == "Posterize"
        ));
        assert!(matches!(
            "add Exposure".parse::<Command>(),
            Err(CommandError::UnknownModifier(_))
        ));
        assert!(matches!(
            "add".parse::<Command>(),
            Err(CommandError::MissingArgument("name"))
        ));
    }

    #[test]
    fn update_parses_json_values() {
        let command: Command = "update abc cursorAt [10, 20]".parse().unwrap();
        assert_eq!(
            command,
            Command::Update {
                id: "abc".into(),
                key: "cursorAt".into(),
                value: ConfigValue::Pair([10.0, 20.0]),
            }
        );

        assert!(matches!(
            "update abc amount nope".parse::<Command>(),
            Err(CommandError::InvalidJson(_))
        ));
        assert!(matches!(
            "update abc amount".parse::<Command>(),
            Err(CommandError::MissingArgument("value"))
        ));
    }

    #[test]
    fn replace_parses_a_stack() {
        let command: Command = r#"replace [{"id":"a","name":"Sepia","needsUpdate":false,"config":{"amount":1}}]"#
            .parse()
            .unwrap();
        let Command::Replace { stack } = command else {
            panic!("expected replace");
        };
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.elements()[0].config["amount"], ConfigValue::Scalar(1.0));
    }

    #[test]
    fn switch_requires_two_indices() {
        assert_eq!(
            "switch 0 2".parse::<Command>().unwrap(),
            Command::Switch {
                first: 0,
                second: 2
            }
        );
        assert!(matches!(
            "switch 0".parse::<Command>(),
            Err(CommandError::MissingArgument("second index"))
        ));
        assert!(matches!(
            "switch a 1".parse::<Command>(),
            Err(CommandError::InvalidIndex(token)) if token == "a"
        ));
    }

    #[test]
    fn only_history_commands_are_not_edits() {
        assert!(!Command::Undo.is_edit());
        assert!(!Command::Redo.is_edit());
        assert!("delete abc".parse::<Command>().unwrap().is_edit());
    }

    #[test]
    fn unknown_and_empty_actions_are_errors() {
        assert!(matches!(
            "explode 1".parse::<Command>(),
            Err(CommandError::UnknownAction(action)) if action == "explode"
        ));
        assert!(matches!(
            "   ".parse::<Command>(),
            Err(CommandError::MissingArgument("action"))
        ));
    }
}
