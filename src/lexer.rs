// src/lexer.rs

use crate::location::Location;
use crate::token::{Token, TokenKind};
use std::sync::Arc;

/// Tokenizer for C/C++ interface sources.
///
/// Comments (`//` and `/* */`) and preprocessor lines are skipped like
/// whitespace, so the parser never sees a declaration that is commented out.
pub struct Lexer<'a> {
    filename: Arc<String>,
    input_chars: std::str::Chars<'a>,
    // Position tracking
    line: usize, // 1-based
    col: usize,  // 1-based
    // Lookahead characters
    current_char: Option<char>,
    peek_char: Option<char>,
    // Only whitespace seen since the last newline
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: String, input: &'a str) -> Self {
        let mut lexer = Lexer {
            filename: Arc::new(filename),
            input_chars: input.chars(),
            line: 1,
            col: 1,
            current_char: None,
            peek_char: None,
            at_line_start: true,
        };
        lexer.read_char(); // Load current_char
        lexer.read_char(); // Load peek_char
        lexer
    }

    // Reads next char and updates position based on the *old* current_char
    fn read_char(&mut self) {
        if let Some(ch) = self.current_char {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
                self.at_line_start = true;
            } else {
                self.col += 1;
                if !ch.is_whitespace() {
                    self.at_line_start = false;
                }
            }
        }

        self.current_char = self.peek_char;
        self.peek_char = self.input_chars.next();
    }

    fn current_location(&self) -> Location {
        Location {
            filename: Arc::clone(&self.filename),
            line: self.line,
            col: self.col,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start_loc = self.current_location();

        let kind = match self.current_char {
            Some('*') => TokenKind::Star,
            Some('&') => TokenKind::Amp,
            Some('<') => TokenKind::LessThan,
            Some('>') => TokenKind::GreaterThan,
            Some('(') => TokenKind::LParen,
            Some(')') => TokenKind::RParen,
            Some('[') => TokenKind::LBracket,
            Some(']') => TokenKind::RBracket,
            Some('{') => TokenKind::LBrace,
            Some('}') => TokenKind::RBrace,
            Some(',') => TokenKind::Comma,
            Some(';') => TokenKind::Semicolon,
            Some('=') => TokenKind::Assign,
            Some(':') => {
                if self.peek_char == Some(':') {
                    self.read_char(); // Consume first ':'
                    TokenKind::PathSep
                } else {
                    TokenKind::Colon
                }
            }
            Some('.') => {
                if self.peek_char == Some('.') {
                    self.read_char();
                    if self.peek_char == Some('.') {
                        self.read_char();
                        TokenKind::Ellipsis
                    } else {
                        TokenKind::Punct('.')
                    }
                } else {
                    TokenKind::Punct('.')
                }
            }
            Some(quote @ ('"' | '\'')) => {
                return self.read_quoted(quote, start_loc);
            }

            Some(ch) if is_identifier_start(ch) => {
                let ident = self.read_while(is_identifier_continue);
                return Token::new(TokenKind::Identifier(ident), start_loc);
            }
            Some(ch) if ch.is_ascii_digit() => {
                // Suffixes and hex digits are swallowed with the number
                let number = self.read_while(|c| c.is_ascii_alphanumeric() || c == '.');
                return Token::new(TokenKind::Number(number), start_loc);
            }

            None => TokenKind::Eof,
            Some(ch) if ch.is_ascii_punctuation() => TokenKind::Punct(ch),
            Some(illegal_ch) => TokenKind::Illegal(illegal_ch),
        };

        self.read_char(); // Advance past the processed char

        Token::new(kind, start_loc)
    }

    // Whitespace, comments and preprocessor directives
    fn skip_trivia(&mut self) {
        loop {
            match (self.current_char, self.peek_char) {
                (Some(ch), _) if ch.is_whitespace() => self.read_char(),
                (Some('/'), Some('/')) => self.skip_line_comment(),
                (Some('/'), Some('*')) => self.skip_block_comment(),
                (Some('#'), _) if self.at_line_start => self.skip_directive(),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.current_char {
            if ch == '\n' {
                break;
            }
            self.read_char();
        }
    }

    // An unterminated block comment swallows the rest of the input
    fn skip_block_comment(&mut self) {
        self.read_char(); // Consume '/'
        self.read_char(); // Consume '*'
        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek_char == Some('/') {
                self.read_char();
                self.read_char();
                return;
            }
            self.read_char();
        }
    }

    // Skips a `#...` line, honouring backslash continuations
    fn skip_directive(&mut self) {
        while let Some(ch) = self.current_char {
            match ch {
                '\\' if self.peek_char == Some('\n') => {
                    self.read_char();
                    self.read_char();
                }
                '\n' => break,
                _ => self.read_char(),
            }
        }
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.current_char {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.read_char();
        }
        text
    }

    // String and char literals, escapes are kept verbatim
    fn read_quoted(&mut self, quote: char, start_loc: Location) -> Token {
        let mut result = String::new();
        self.read_char(); // Consume the opening quote

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.read_char(); // Consume closing quote
                let kind = if quote == '"' {
                    TokenKind::StringLiteral(result)
                } else {
                    TokenKind::CharLiteral(result)
                };
                return Token::new(kind, start_loc);
            }
            if ch == '\\' {
                result.push(ch);
                self.read_char();
                match self.current_char {
                    Some(escaped) => result.push(escaped),
                    None => break,
                }
            } else {
                result.push(ch);
            }
            self.read_char();
        }

        // EOF before the closing quote
        Token::new(TokenKind::Illegal(quote), start_loc)
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new("test.h".to_string(), input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    #[test]
    fn test_declaration_sequence() {
        let tokens = kinds("DLL_EXPORT void add_f(float32* a, Imterface<uint8> &b)");
        assert_eq!(
            tokens,
            vec![
                ident("DLL_EXPORT"),
                ident("void"),
                ident("add_f"),
                TokenKind::LParen,
                ident("float32"),
                TokenKind::Star,
                ident("a"),
                TokenKind::Comma,
                ident("Imterface"),
                TokenKind::LessThan,
                ident("uint8"),
                TokenKind::GreaterThan,
                TokenKind::Amp,
                ident("b"),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let input = "// DLL_EXPORT void hidden();\n/* DLL_EXPORT\n int gone(); */ int x; // trailing";
        assert_eq!(
            kinds(input),
            vec![ident("int"), ident("x"), TokenKind::Semicolon]
        );
    }

    #[test]
    fn test_preprocessor_lines_are_skipped() {
        let input = "#define DLL_EXPORT extern \"C\" \\\n    __declspec(dllexport)\n#include <iostream>\nint y;";
        assert_eq!(
            kinds(input),
            vec![ident("int"), ident("y"), TokenKind::Semicolon]
        );
    }

    #[test]
    fn test_hash_inside_line_is_punct() {
        assert_eq!(kinds("a # b"), vec![ident("a"), TokenKind::Punct('#'), ident("b")]);
    }

    #[test]
    fn test_extern_c_string() {
        assert_eq!(
            kinds("extern \"C\""),
            vec![ident("extern"), TokenKind::StringLiteral("C".to_string())]
        );
    }

    #[test]
    fn test_path_sep_and_ellipsis() {
        assert_eq!(
            kinds("std::size_t n, ..."),
            vec![
                ident("std"),
                TokenKind::PathSep,
                ident("size_t"),
                ident("n"),
                TokenKind::Comma,
                TokenKind::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_numbers_and_chars() {
        assert_eq!(
            kinds("v[16] = 'a' 0x1Fu"),
            vec![
                ident("v"),
                TokenKind::LBracket,
                TokenKind::Number("16".to_string()),
                TokenKind::RBracket,
                TokenKind::Assign,
                TokenKind::CharLiteral("a".to_string()),
                TokenKind::Number("0x1Fu".to_string()),
            ]
        );
    }

    #[test]
    fn test_locations() {
        let mut lexer = Lexer::new("test.h".to_string(), "int\n  foo");
        let first = lexer.next_token();
        assert_eq!((first.loc.line, first.loc.col), (1, 1));
        let second = lexer.next_token();
        assert_eq!((second.loc.line, second.loc.col), (2, 3));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(kinds("\"abc"), vec![TokenKind::Illegal('"')]);
    }
}
