// src/token.rs

use crate::location::Location;
use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    // Special Tokens
    Illegal(char),
    Eof,

    // Literals
    Number(String),        // kept as written, only ever re-rendered
    StringLiteral(String), // e.g. the "C" in extern "C"
    CharLiteral(String),

    // Declarator punctuation
    Star,        // '*'
    Amp,         // '&'
    LessThan,    // '<'
    GreaterThan, // '>'
    LParen,      // '('
    RParen,      // ')'
    LBracket,    // '['
    RBracket,    // ']'
    LBrace,      // '{'
    RBrace,      // '}'
    Comma,       // ','
    Semicolon,   // ';'
    Colon,       // ':'
    PathSep,     // '::'
    Assign,      // '=' (default arguments)
    Ellipsis,    // '...'

    // Any other operator char inside bodies, never part of a declaration
    Punct(char),

    // Identifiers (keywords included, the parser decides what they mean)
    Identifier(String),
}

impl TokenKind {
    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, TokenKind::Identifier(ident) if ident == name)
    }
}

// Renders the token back to source spelling, used to rebuild type names
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Illegal(ch) | TokenKind::Punct(ch) => write!(f, "{}", ch),
            TokenKind::Eof => write!(f, "<eof>"),
            TokenKind::Number(text) => write!(f, "{}", text),
            TokenKind::StringLiteral(text) => write!(f, "\"{}\"", text),
            TokenKind::CharLiteral(text) => write!(f, "'{}'", text),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::LessThan => write!(f, "<"),
            TokenKind::GreaterThan => write!(f, ">"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::PathSep => write!(f, "::"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Ellipsis => write!(f, "..."),
            TokenKind::Identifier(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Location,
}

impl Token {
    pub fn new(kind: TokenKind, loc: Location) -> Self {
        Token { kind, loc }
    }
}

/// Joins declaration tokens into the canonical type spelling: words are
/// separated by one space, punctuation is attached (`unsigned char`,
/// `float32*`, `Imterface<float32>`).
pub fn render_type(tokens: &[TokenKind]) -> String {
    let mut out = String::new();
    let mut prev_word = false;
    for kind in tokens {
        let is_word = matches!(
            kind,
            TokenKind::Identifier(_) | TokenKind::Number(_) | TokenKind::StringLiteral(_)
        );
        if is_word && prev_word {
            out.push(' ');
        }
        out.push_str(&kind.to_string());
        prev_word = is_word;
    }
    out
}

// C and Python agree on the ASCII identifier shape
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    #[test]
    fn render_multi_word_type() {
        let tokens = vec![ident("unsigned"), ident("char"), TokenKind::Star];
        assert_eq!(render_type(&tokens), "unsigned char*");
    }

    #[test]
    fn render_template_type() {
        let tokens = vec![
            ident("Imterface"),
            TokenKind::LessThan,
            ident("float32"),
            TokenKind::GreaterThan,
        ];
        assert_eq!(render_type(&tokens), "Imterface<float32>");
    }

    #[test]
    fn identifier_shape() {
        assert!(is_identifier("_lib2"));
        assert!(!is_identifier("2lib"));
        assert!(!is_identifier("my-lib"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn render_namespaced_type() {
        let tokens = vec![ident("const"), ident("std"), TokenKind::PathSep, ident("size_t")];
        assert_eq!(render_type(&tokens), "const std::size_t");
    }
}
