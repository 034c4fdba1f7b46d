// src/parser.rs

use crate::ast::{FunctionDescriptor, InterfaceUnit};
use crate::config::{DEFAULT_EXPORT_MARKER, DEFAULT_OUT_KEYWORD};
use crate::lexer::Lexer;
use crate::location::{Location, Span};
use crate::token::{render_type, Token, TokenKind};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{span}: Parse Error: Expected a function name after '{marker}'")]
    MissingFunctionName { marker: String, span: Span },
    #[error("{span}: Parse Error: Expected '(' to open the parameter list, found '{found}'")]
    ExpectedParameterList { found: String, span: Span },
    #[error("{span}: Parse Error: Parameter list of '{function}' is never closed")]
    UnterminatedParameterList { function: String, span: Span },
    #[error("{span}: Parse Error: Empty parameter #{index} in '{function}'")]
    EmptyParameter {
        function: String,
        index: usize,
        span: Span,
    },
    #[error("{span}: Parse Error: Variadic function '{function}' cannot be bound")]
    VariadicParameter { function: String, span: Span },
    #[error("{span}: Parse Error: '{ident}' is a Python keyword and cannot name a binding")]
    ReservedIdentifier { ident: String, span: Span },
}

pub type ParseResult<T> = Result<T, ParseError>;

// Tokens between the marker and the name that say nothing about the type
const CALLING_CONVENTIONS: &[&str] = &["__cdecl", "__stdcall", "__fastcall", "__vectorcall"];
const ATTRIBUTE_KEYWORDS: &[&str] = &["__declspec", "__attribute__"];

// Ignored when deciding whether a parameter carries a name
const CV_QUALIFIERS: &[&str] = &[
    "const",
    "volatile",
    "restrict",
    "__restrict",
    "struct",
    "enum",
    "union",
];
const BUILTIN_TYPES: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
];

// Names that would not compile as Python identifiers
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Recursive descent parser for exported declarations.
///
/// Everything that is not introduced by the export marker is skipped, so
/// function bodies, includes and helper templates in the same file are
/// ignored.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    peek_token: Token,
    export_marker: String,
    out_keyword: String,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        let mut parser = Parser {
            lexer,
            current_token: Token::new(TokenKind::Eof, Location::default()),
            peek_token: Token::new(TokenKind::Eof, Location::default()),
            export_marker: DEFAULT_EXPORT_MARKER.to_string(),
            out_keyword: DEFAULT_OUT_KEYWORD.to_string(),
        };
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn with_export_marker(mut self, marker: impl Into<String>) -> Self {
        self.export_marker = marker.into();
        self
    }

    pub fn with_out_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.out_keyword = keyword.into();
        self
    }

    fn next_token(&mut self) {
        self.current_token = self.peek_token.clone();
        self.peek_token = self.lexer.next_token();
    }

    fn at_eof(&self) -> bool {
        self.current_token.kind == TokenKind::Eof
    }

    fn at_marker(&self) -> bool {
        self.current_token.kind.is_identifier(&self.export_marker)
    }

    // --- Main Parsing Logic: scan the whole file ---

    /// Extracts every exported declaration in source order. All errors of
    /// the file are collected; parsing resumes at the next marker.
    pub fn parse_unit(&mut self) -> Result<InterfaceUnit, Vec<ParseError>> {
        let mut unit = InterfaceUnit::new();
        let mut errors = Vec::new();

        while !self.at_eof() {
            if !self.at_marker() {
                self.next_token();
                continue;
            }
            match self.parse_declaration() {
                Ok(descriptor) => unit.insert(descriptor),
                Err(err) => {
                    errors.push(err);
                    // Recover at the next marker
                    while !self.at_eof() && !self.at_marker() {
                        self.next_token();
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(unit)
        } else {
            Err(errors)
        }
    }

    // Parses: MARKER qualifier* type-token* IDENT ( params )
    fn parse_declaration(&mut self) -> ParseResult<FunctionDescriptor> {
        let start_loc = self.current_token.loc.clone();
        self.next_token(); // Consume marker

        let head = self.parse_declaration_head()?;
        let (name_token, type_tokens) = match head.split_last() {
            Some((last, rest)) if matches!(last.kind, TokenKind::Identifier(_)) => (last, rest),
            _ => {
                return Err(ParseError::MissingFunctionName {
                    marker: self.export_marker.clone(),
                    span: Span::single(start_loc),
                })
            }
        };
        let name = name_token.kind.to_string();
        check_identifier(&name, &name_token.loc)?;

        let kinds: Vec<TokenKind> = type_tokens.iter().map(|t| t.kind.clone()).collect();
        let return_type = render_type(&kinds);

        let open_loc = self.current_token.loc.clone();
        let (fragments, close_loc) = self.parse_parameter_fragments(&name, open_loc)?;

        let mut parameters = Vec::new();
        let mut output_buffer_parameters = Vec::new();
        for (index, fragment) in fragments.iter().enumerate() {
            let param_name = self.parameter_name(fragment, index);
            if let Some(first) = fragment.first() {
                check_identifier(&param_name, &first.loc)?;
            }
            if self.is_output_buffer(fragment) {
                output_buffer_parameters.push(param_name);
            } else {
                parameters.push(param_name);
            }
        }

        let span = Span::from_locations(start_loc, close_loc);
        debug!(
            "{}: extracted '{}' returning '{}' ({} params, {} output buffers)",
            span,
            name,
            return_type,
            parameters.len(),
            output_buffer_parameters.len()
        );

        Ok(FunctionDescriptor {
            name,
            return_type,
            parameters,
            output_buffer_parameters,
            span,
        })
    }

    // Collects `return_type name` up to the '(' of the parameter list,
    // dropping linkage and attribute qualifiers. Leaves '(' as current token.
    fn parse_declaration_head(&mut self) -> ParseResult<Vec<Token>> {
        let mut head = Vec::new();
        let mut angle_depth = 0usize;

        loop {
            let kind = self.current_token.kind.clone();
            match kind {
                TokenKind::LParen if angle_depth == 0 => return Ok(head),
                TokenKind::LParen => {
                    // e.g. std::function<void(int)>
                    let group = self.collect_group().ok_or_else(|| self.unexpected_head())?;
                    head.extend(group);
                    continue;
                }
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace => {
                    return Err(self.unexpected_head())
                }
                TokenKind::Identifier(ref ident) if *ident == self.export_marker => {
                    return Err(self.unexpected_head())
                }
                TokenKind::Identifier(ref ident) if ident == "extern" => {
                    self.next_token(); // Consume 'extern'
                    if matches!(self.current_token.kind, TokenKind::StringLiteral(_)) {
                        self.next_token(); // Consume "C"
                    }
                    continue;
                }
                TokenKind::Identifier(ref ident)
                    if ATTRIBUTE_KEYWORDS.contains(&ident.as_str())
                        && self.peek_token.kind == TokenKind::LParen =>
                {
                    self.next_token(); // Consume keyword
                    self.collect_group().ok_or_else(|| self.unexpected_head())?;
                    continue;
                }
                TokenKind::Identifier(ref ident) if CALLING_CONVENTIONS.contains(&ident.as_str()) => {}
                TokenKind::LessThan => {
                    angle_depth += 1;
                    head.push(self.current_token.clone());
                }
                TokenKind::GreaterThan => {
                    angle_depth = angle_depth.saturating_sub(1);
                    head.push(self.current_token.clone());
                }
                _ => head.push(self.current_token.clone()),
            }
            self.next_token();
        }
    }

    fn unexpected_head(&self) -> ParseError {
        ParseError::ExpectedParameterList {
            found: self.current_token.kind.to_string(),
            span: Span::single(self.current_token.loc.clone()),
        }
    }

    // Collects a balanced '(' ... ')' group including both parens.
    // None when the input ends first.
    fn collect_group(&mut self) -> Option<Vec<Token>> {
        let mut group = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.current_token.kind {
                TokenKind::Eof => return None,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            group.push(self.current_token.clone());
            self.next_token();
            if depth == 0 {
                return Some(group);
            }
        }
    }

    // Splits the parameter list at top-level commas. Returns the fragments
    // and the location of the closing ')'.
    fn parse_parameter_fragments(
        &mut self,
        function: &str,
        open_loc: Location,
    ) -> ParseResult<(Vec<Vec<Token>>, Location)> {
        let group = self
            .collect_group()
            .ok_or_else(|| ParseError::UnterminatedParameterList {
                function: function.to_string(),
                span: Span::single(open_loc.clone()),
            })?;

        // A collected group always holds both parens
        let close_loc = group
            .last()
            .map(|t| t.loc.clone())
            .unwrap_or_else(|| open_loc.clone());
        let inner = if group.len() >= 2 {
            &group[1..group.len() - 1]
        } else {
            &group[..0]
        };

        if inner.is_empty() {
            return Ok((Vec::new(), close_loc));
        }
        if inner.len() == 1 && inner[0].kind.is_identifier("void") {
            return Ok((Vec::new(), close_loc));
        }

        let mut fragments: Vec<Vec<Token>> = vec![Vec::new()];
        let mut depth = 0usize;
        for token in inner {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LessThan => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::GreaterThan => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => {
                    fragments.push(Vec::new());
                    continue;
                }
                _ => {}
            }
            if let Some(current) = fragments.last_mut() {
                current.push(token.clone());
            }
        }

        for (index, fragment) in fragments.iter().enumerate() {
            if fragment.is_empty() {
                return Err(ParseError::EmptyParameter {
                    function: function.to_string(),
                    index,
                    span: Span::single(open_loc),
                });
            }
            if fragment.iter().any(|t| t.kind == TokenKind::Ellipsis) {
                return Err(ParseError::VariadicParameter {
                    function: function.to_string(),
                    span: Span::single(fragment[0].loc.clone()),
                });
            }
        }

        Ok((fragments, close_loc))
    }

    fn is_output_buffer(&self, fragment: &[Token]) -> bool {
        top_level(fragment)
            .iter()
            .any(|t| t.kind.is_identifier(&self.out_keyword))
    }

    /// Name of one parameter: the declarator inside a function-pointer
    /// group, otherwise the last top-level word. Unnamed parameters get
    /// `arg<index>`.
    fn parameter_name(&self, fragment: &[Token], index: usize) -> String {
        if let Some(name) = function_pointer_name(fragment) {
            return name;
        }

        let significant: Vec<&Token> = top_level(fragment)
            .into_iter()
            .filter(|t| {
                !t.kind.is_identifier(&self.out_keyword)
                    && !matches!(&t.kind, TokenKind::Identifier(w) if CV_QUALIFIERS.contains(&w.as_str()))
            })
            .collect();
        // `std::size_t` is one word: a segment after `::` replaces its qualifier
        let mut words: Vec<&str> = Vec::new();
        for (i, token) in significant.iter().enumerate() {
            if let TokenKind::Identifier(w) = &token.kind {
                let qualified = i >= 2
                    && significant[i - 1].kind == TokenKind::PathSep
                    && matches!(significant[i - 2].kind, TokenKind::Identifier(_));
                if qualified {
                    words.pop();
                }
                words.push(w.as_str());
            }
        }

        let ends_with_word = matches!(
            significant.last().map(|t| &t.kind),
            Some(TokenKind::Identifier(_))
        );
        match words.last() {
            Some(last) if ends_with_word && words.len() >= 2 && !BUILTIN_TYPES.contains(last) => {
                last.to_string()
            }
            _ => format!("arg{}", index),
        }
    }
}

// Tokens at nesting depth zero, cut at a default-argument '='
fn top_level(fragment: &[Token]) -> Vec<&Token> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    for token in fragment {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LessThan => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::GreaterThan => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Assign if depth == 0 => break,
            _ if depth == 0 => out.push(token),
            _ => {}
        }
    }
    out
}

// `ret (*name)(args)` or `ret (&name)[4]`
fn function_pointer_name(fragment: &[Token]) -> Option<String> {
    let open = fragment.iter().position(|t| t.kind == TokenKind::LParen)?;
    let close = fragment[open..]
        .iter()
        .position(|t| t.kind == TokenKind::RParen)?
        + open;
    let inner = &fragment[open + 1..close];
    let is_declarator = inner.iter().any(|t| matches!(t.kind, TokenKind::Star | TokenKind::Amp))
        && inner.iter().all(|t| {
            matches!(t.kind, TokenKind::Star | TokenKind::Amp | TokenKind::Identifier(_))
        });
    if !is_declarator {
        return None;
    }
    inner.iter().rev().find_map(|t| match &t.kind {
        TokenKind::Identifier(name) if !CALLING_CONVENTIONS.contains(&name.as_str()) => {
            Some(name.clone())
        }
        _ => None,
    })
}

fn check_identifier(ident: &str, loc: &Location) -> ParseResult<()> {
    if PYTHON_KEYWORDS.contains(&ident) {
        return Err(ParseError::ReservedIdentifier {
            ident: ident.to_string(),
            span: Span::single(loc.clone()),
        });
    }
    Ok(())
}

/// Parses one interface source with the given marker and output keyword.
pub fn parse_interface(
    filename: &str,
    source: &str,
    export_marker: &str,
    out_keyword: &str,
) -> Result<InterfaceUnit, Vec<ParseError>> {
    let lexer = Lexer::new(filename.to_string(), source);
    Parser::new(lexer)
        .with_export_marker(export_marker)
        .with_out_keyword(out_keyword)
        .parse_unit()
}
