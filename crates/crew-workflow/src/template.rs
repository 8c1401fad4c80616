//! Placeholder rendering for task instructions
//!
//! Templates use single-brace placeholders: `{topic}` is replaced by the
//! `topic` input, `{{` and `}}` produce literal braces. Anything else inside
//! braces that is not an identifier is left untouched.

use crew_core::Inputs;
use std::fmt;

/// A template referenced placeholders that have no value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPlaceholders(pub Vec<String>);

impl fmt::Display for MissingPlaceholders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no value for {}", self.0.join(", "))
    }
}

impl std::error::Error for MissingPlaceholders {}

enum Piece<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal text and placeholder names
fn pieces(template: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let bytes = template.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                out.push(Piece::Literal(&template[start..i]));
                out.push(Piece::Literal("{"));
                i += 2;
                start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push(Piece::Literal(&template[start..i]));
                out.push(Piece::Literal("}"));
                i += 2;
                start = i;
            }
            b'{' => {
                let name_len = template[i + 1..]
                    .find('}')
                    .filter(|&len| is_identifier(&template[i + 1..i + 1 + len]));
                if let Some(len) = name_len {
                    out.push(Piece::Literal(&template[start..i]));
                    out.push(Piece::Placeholder(&template[i + 1..i + 1 + len]));
                    i += len + 2;
                    start = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    out.push(Piece::Literal(&template[start..]));
    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Placeholder names used by a template, in order of first appearance
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for piece in pieces(template) {
        if let Piece::Placeholder(name) = piece {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Render a template against the run-time inputs
///
/// # Errors
///
/// Returns every placeholder that has no value in `inputs`.
pub fn render(template: &str, inputs: &Inputs) -> Result<String, MissingPlaceholders> {
    let mut rendered = String::with_capacity(template.len());
    let mut missing: Vec<String> = Vec::new();

    for piece in pieces(template) {
        match piece {
            Piece::Literal(text) => rendered.push_str(text),
            Piece::Placeholder(name) => match inputs.get(name) {
                Some(value) => rendered.push_str(value),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                }
            },
        }
    }

    if missing.is_empty() {
        Ok(rendered)
    } else {
        Err(MissingPlaceholders(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_inputs() {
        let inputs = Inputs::new().with_topic("Baltic shipping");
        assert_eq!(
            render("Research {topic} and {topic} again", &inputs).unwrap(),
            "Research Baltic shipping and Baltic shipping again"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let inputs = Inputs::new().with_topic("x");
        assert_eq!(
            render("Return {{\"topic\": \"{topic}\"}}", &inputs).unwrap(),
            "Return {\"topic\": \"x\"}"
        );
    }

    #[test]
    fn test_non_identifiers_are_literal() {
        let inputs = Inputs::new();
        assert_eq!(render("a { b } {1} {", &inputs).unwrap(), "a { b } {1} {");
    }

    #[test]
    fn test_missing_placeholders_are_reported_once() {
        let inputs = Inputs::new().with_topic("x");
        let err = render("{user_action} {topic} {intelligence_context} {user_action}", &inputs).unwrap_err();
        assert_eq!(err.0, vec!["user_action", "intelligence_context"]);
        assert!(err.to_string().contains("user_action"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("{intelligence_context} then {user_action} {{literal}} {intelligence_context}"),
            vec!["intelligence_context", "user_action"]
        );
    }

    #[test]
    fn test_unicode_text_is_preserved() {
        let inputs = Inputs::new().with_topic("Čierne more");
        assert_eq!(render("Téma: {topic} – správa", &inputs).unwrap(), "Téma: Čierne more – správa");
    }
}
