//! Line-oriented cutscene text.
//!
//! One action per line: `command arg arg ...` followed by `;` (wait for it) or `,` (carry on).
//! Arguments are positional; a blank line ends the script.
//!
//! ```text
//! add josh 1 0;
//! move 1 2,
//! babble 1 start;
//! delay 1200;
//! emote 1 happy;
//! ```

use std::rc::Rc;

use serde_json::Value;

use super::{Action, Actors, Cutscene};
use crate::api::error::ScriptError;

/// Positional argument names of the built-in commands; `true` marks a required one.
fn parameters(command: &str) -> &'static [(&'static str, bool)] {
    match command {
        "add" => &[("name", true), ("id", true), ("position", false), ("facingLeft", false), ("emote", false)],
        "set" => &[("target", true), ("name", true)],
        "remove" | "jiggle" => &[("target", true)],
        "delay" => &[("duration", true)],
        "move" => &[("target", true), ("position", true)],
        "facingLeft" => &[("target", true), ("facingLeft", true)],
        "babble" => &[("target", true), ("action", false)],
        "emote" => &[("target", true), ("emote", false)],
        _ => &[],
    }
}

/// Bare numbers and booleans keep their type; anything else is text.
fn token_value(token: &str) -> Value {
    match token {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = token.parse::<i64>() {
                Value::from(n)
            } else if let Some(n) = token.parse::<f64>().ok().filter(|n| n.is_finite()) {
                Value::from(n)
            } else {
                Value::String(token.to_string())
            }
        }
    }
}

/// Parse script text into action records.
///
/// Commands outside the built-in set keep their arguments, in order, under `args`.
pub fn parse_script(text: &str) -> Result<Vec<Action>, ScriptError> {
    let mut actions = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            break;
        }

        let wait = match trimmed.chars().last() {
            Some(';') => true,
            Some(',') => false,
            _ => return Err(ScriptError::MissingTerminator { line }),
        };
        let body = trimmed[..trimmed.len() - 1].trim();
        let mut tokens = body.split_whitespace();
        let Some(command) = tokens.next() else {
            return Err(ScriptError::EmptyAction { line });
        };
        let arguments: Vec<&str> = tokens.collect();

        let mut action = Action::new(command);
        action.wait = wait;
        let names = parameters(command);
        if names.is_empty() {
            let args: Vec<Value> = arguments.iter().map(|t| token_value(t)).collect();
            if !args.is_empty() {
                action.fields.insert("args".to_string(), Value::Array(args));
            }
        }
        for (position, &(name, required)) in names.iter().enumerate() {
            match arguments.get(position) {
                Some(token) => {
                    action.fields.insert(name.to_string(), token_value(token));
                }
                None if required => {
                    return Err(ScriptError::MissingArgument {
                        line,
                        command: command.to_string(),
                        argument: name,
                    });
                }
                None => {}
            }
        }
        actions.push(action);
    }
    Ok(actions)
}

impl Cutscene {
    /// Parse script text into a cutscene.
    pub fn from_script(text: &str, actors: Rc<Actors>) -> Result<Self, ScriptError> {
        Ok(Self::new(parse_script(text)?, actors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PuppetId;

    #[test]
    fn terminators_set_wait() {
        let actions = parse_script("add josh 1 2 true happy;\nmove 1 4,\n").unwrap();
        assert_eq!(actions.len(), 2);
        let add = &actions[0];
        assert!(add.wait);
        assert_eq!(add.text("name").as_deref(), Some("josh"));
        assert_eq!(add.puppet_id("id").unwrap(), PuppetId(1));
        assert_eq!(add.slot("position").unwrap(), Some(2));
        assert_eq!(add.flag("facingLeft").unwrap(), Some(true));
        assert_eq!(add.text("emote").as_deref(), Some("happy"));
        assert!(!actions[1].wait);
        assert_eq!(actions[1].target().unwrap(), PuppetId(1));
    }

    #[test]
    fn blank_line_ends_the_script() {
        let actions = parse_script("  jiggle 2;  \n\nremove 2;\n").unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].command, "jiggle");
    }

    #[test]
    fn optional_arguments_may_be_left_out() {
        let actions = parse_script("babble 3;\nemote 3 2;").unwrap();
        assert!(actions[0].field("action").is_none());
        assert_eq!(actions[1].text("emote").as_deref(), Some("2"));
    }

    #[test]
    fn unknown_commands_keep_raw_arguments() {
        let actions = parse_script("spotlight 1 warm;").unwrap();
        assert_eq!(actions[0].field("args"), Some(&serde_json::json!([1, "warm"])));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(parse_script("move 1 2"), Err(ScriptError::MissingTerminator { line: 1 }));
        assert_eq!(parse_script("jiggle 1;\n;"), Err(ScriptError::EmptyAction { line: 2 }));
        assert_eq!(
            parse_script("move 1;"),
            Err(ScriptError::MissingArgument {
                line: 1,
                command: "move".into(),
                argument: "position",
            })
        );
    }
}
