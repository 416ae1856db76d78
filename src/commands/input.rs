//! Text command parsing
//!
//! A command line is a name followed by `key=value` options and bare
//! arguments: `remind vitamin=zinc times=08:00,20:00 days=weekdays`.
//! Values containing spaces are wrapped in double quotes:
//! `note-add text="Felt great today"`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandInput {
    pub name: String,
    pub options: HashMap<String, String>,
    /// Tokens without `=`, in order
    pub args: Vec<String>,
}

impl CommandInput {
    /// Parse a line. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let tokens = tokenize(line)?;
        let mut tokens = tokens.into_iter();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };

        let mut input = CommandInput {
            name: name.trim_start_matches('/').to_lowercase(),
            ..Default::default()
        };
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    input.options.insert(key.to_lowercase(), value.to_string());
                }
                _ => input.args.push(token),
            }
        }
        Ok(Some(input))
    }

    pub fn get_string_option(&self, name: &str) -> Option<String> {
        self.options
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Named option, falling back to the positional argument at `index`
    pub fn get_string_or_arg(&self, name: &str, index: usize) -> Option<String> {
        self.get_string_option(name)
            .or_else(|| self.args.get(index).cloned())
    }

    pub fn require_string(&self, name: &str) -> Result<String> {
        self.get_string_option(name)
            .ok_or_else(|| anyhow!("Missing {name}=... option"))
    }

    pub fn get_integer_option(&self, name: &str) -> Result<Option<i64>> {
        self.get_string_option(name)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| anyhow!("Option {name} must be a whole number, got '{v}'"))
            })
            .transpose()
    }

    pub fn get_bool_option(&self, name: &str) -> Result<Option<bool>> {
        self.get_string_option(name)
            .map(|v| match v.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(anyhow!("Option {name} must be true or false, got '{v}'")),
            })
            .transpose()
    }

    /// Comma separated option split into trimmed, non-empty parts
    pub fn get_list_option(&self, name: &str) -> Vec<String> {
        self.get_string_option(name)
            .map(|v| {
                v.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        bail!("Unclosed quote in command");
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line() {
        assert_eq!(CommandInput::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_options_and_args() {
        let input = CommandInput::parse("/Remind vitamin=zinc times=08:00,20:00 extra")
            .unwrap()
            .unwrap();
        assert_eq!(input.name, "remind");
        assert_eq!(input.get_string_option("vitamin").as_deref(), Some("zinc"));
        assert_eq!(input.get_list_option("times"), vec!["08:00", "20:00"]);
        assert_eq!(input.args, vec!["extra"]);
        assert!(input.get_string_option("missing").is_none());
        assert!(input.require_string("missing").is_err());
    }

    #[test]
    fn test_quoted_values() {
        let input = CommandInput::parse(r#"note-add text="Felt great, no nausea" """#)
            .unwrap()
            .unwrap();
        assert_eq!(
            input.get_string_option("text").as_deref(),
            Some("Felt great, no nausea")
        );
        // An empty quoted token is still an argument
        assert_eq!(input.args, vec![""]);

        assert!(CommandInput::parse(r#"note-add text="oops"#).is_err());
    }

    #[test]
    fn test_typed_options() {
        let input = CommandInput::parse("x n=42 flag=yes bad=maybe word=abc")
            .unwrap()
            .unwrap();
        assert_eq!(input.get_integer_option("n").unwrap(), Some(42));
        assert_eq!(input.get_integer_option("none").unwrap(), None);
        assert!(input.get_integer_option("word").is_err());
        assert_eq!(input.get_bool_option("flag").unwrap(), Some(true));
        assert!(input.get_bool_option("bad").is_err());
    }

    #[test]
    fn test_positional_fallback() {
        let input = CommandInput::parse("cancel 3f2a").unwrap().unwrap();
        assert_eq!(input.get_string_or_arg("id", 0).as_deref(), Some("3f2a"));
    }
}
