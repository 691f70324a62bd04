use regex::Regex;

use crate::tokenizer::{
    symbol::{Delimiter, Operator},
    token::{Token, TokenSpan},
};

/// Prepares filter text for the tokenizer and the token stream for the parser.
///
/// Filters are authored as multi-line text but evaluate as a single line,
/// so every line break becomes a space before tokenizing.
pub struct Preprocessor {
    re_line_break: Regex,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            // A literal pattern; compilation cannot fail.
            re_line_break: Regex::new(r"\r\n|\r|\n").expect("line break pattern"),
        }
    }

    pub fn normalize(&self, input: &str) -> String {
        self.re_line_break.replace_all(input, " ").into_owned()
    }

    /// Drops whitespace tokens; the parser only sees significant tokens.
    pub fn strip_trivia(&self, tokens: Vec<TokenSpan>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    /// How deeply the parser will have to recurse for these tokens.
    ///
    /// Brackets, prefix `!`/`-` runs and `?` branches each add a level; a
    /// closing bracket releases everything opened since its opening bracket.
    pub fn nesting_depth(&self, tokens: &[Token]) -> usize {
        let mut frames: Vec<usize> = Vec::new();
        let mut depth = 0;
        let mut prefix = 0;
        let mut deepest = 0;
        let mut previous: Option<&Token> = None;

        for token in tokens {
            match token {
                Token::Delimiter(
                    Delimiter::OpenParen | Delimiter::OpenBracket | Delimiter::OpenBrace,
                ) => {
                    frames.push(prefix + 1);
                    depth += prefix + 1;
                    prefix = 0;
                }
                Token::Delimiter(
                    Delimiter::CloseParen | Delimiter::CloseBracket | Delimiter::CloseBrace,
                ) => {
                    depth -= frames.pop().unwrap_or(0).min(depth);
                    prefix = 0;
                }
                Token::Operator(Operator::Question) => {
                    depth += 1;
                    if let Some(frame) = frames.last_mut() {
                        *frame += 1;
                    }
                    prefix = 0;
                }
                Token::Operator(Operator::Not) => prefix += 1,
                Token::Operator(Operator::Minus) if is_prefix_position(previous) => prefix += 1,
                _ => prefix = 0,
            }
            deepest = deepest.max(depth + prefix);
            previous = Some(token);
        }
        deepest
    }
}

fn is_prefix_position(previous: Option<&Token>) -> bool {
    match previous {
        None | Some(Token::Operator(_)) => true,
        Some(Token::Delimiter(delimiter)) => !matches!(
            delimiter,
            Delimiter::CloseParen | Delimiter::CloseBracket | Delimiter::CloseBrace
        ),
        _ => false,
    }
}
