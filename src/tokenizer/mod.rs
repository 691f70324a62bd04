//! # Filter Expression Tokenizer
//!
//! Turns filter expression text into a stream of [`token::TokenSpan`]s.
//!
//! The tokenizer is built from small `nom` parsers, one per token family:
//!
//! * [`literal`]: numbers and quoted strings
//! * [`symbol`]: operators and delimiters
//! * [`keyword`]: reserved words (`true`, `false`, `null`, `in`)
//! * [`whitespace`]: spaces and tabs, kept as tokens so spans stay exact
//!
//! Line breaks never reach the tokenizer; the [`crate::preprocessor`] folds
//! them into spaces first.

pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
