//! `from __future__ import ...` detection
//!
//! Future statements are only legal at the top of a module, after an
//! optional docstring. Detection stops at the first other statement.

use crate::tokenizer::{tokenize, Token, TokenKind};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FutureFeatures {
    names: BTreeSet<String>,
}

impl FutureFeatures {
    pub fn contains(&self, feature: &str) -> bool {
        self.names.contains(feature)
    }

    pub fn print_function(&self) -> bool {
        self.contains("print_function")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Feature names imported from `__future__` in the module header.
///
/// A source that cannot be tokenized yields whatever was found before the
/// error.
pub fn detect_future_features(source: &str) -> FutureFeatures {
    let mut features = FutureFeatures::default();
    let mut statement: Vec<Token> = Vec::new();
    let mut docstring_allowed = true;

    for token in tokenize(source) {
        let Ok(token) = token else { break };
        match token.kind {
            TokenKind::Comment | TokenKind::Nl | TokenKind::Indent | TokenKind::Dedent => continue,
            TokenKind::Newline | TokenKind::EndMarker => {
                let parts: Vec<&[Token]> = statement.split(|t| t.lexeme == ";").collect();
                for part in parts.into_iter().filter(|part| !part.is_empty()) {
                    if docstring_allowed && part.iter().all(|t| t.kind == TokenKind::String) {
                        docstring_allowed = false;
                        continue;
                    }
                    docstring_allowed = false;
                    if !collect_future_import(part, &mut features) {
                        return features;
                    }
                }
                statement.clear();
                if token.kind == TokenKind::EndMarker {
                    break;
                }
            }
            _ => statement.push(token),
        }
    }
    features
}

/// Adds the names of a `from __future__ import` statement. Returns false if
/// `tokens` is some other statement.
fn collect_future_import(tokens: &[Token], features: &mut FutureFeatures) -> bool {
    let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    let ["from", "__future__", "import", rest @ ..] = lexemes.as_slice() else {
        return false;
    };
    let names = rest.iter().filter(|lexeme| !matches!(**lexeme, "(" | ")"));
    let mut expect_name = true;
    let mut after_as = false;
    for lexeme in names {
        match *lexeme {
            "," => {
                expect_name = true;
                after_as = false;
            }
            "as" => after_as = true,
            name if expect_name && !after_as => {
                features.names.insert(name.to_string());
                expect_name = false;
            }
            _ => {}
        }
    }
    true
}
