//! Path template compilation.
//!
//! # Grammar
//! ```text
//! Template  = "/" [ Segments ] [ Verb ] ;
//! Segments  = Segment { "/" Segment } ;
//! Segment   = "*" | "**" | LITERAL | Variable ;
//! Variable  = "{" FieldPath [ "=" Pattern ] "}" ;
//! Pattern   = PatSeg { "/" PatSeg } ;
//! PatSeg    = "*" | "**" | LITERAL ;
//! FieldPath = IDENT { "." IDENT } ;
//! Verb      = ":" LITERAL ;
//! ```
//!
//! # Design Decisions
//! - `{x}` is shorthand for `{x=*}`
//! - Variables are flattened away for the trie; their spans are kept on the
//!   side so bindings can be recovered after a match
//! - A `**` must be the last path segment, inside or outside a variable
//! - Literals are percent-decoded into their trie keys, so they compare
//!   against decoded request segments; `?` and `#` are never literal text

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use crate::routing::segments::{decode_segment, DecodeError};

/// Characters that may not appear inside a literal.
const RESERVED: &[char] = &['/', '{', '}', '*', ':', '?', '#'];

/// One parsed segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Literal text as written; it matches its decoded form.
    Literal(String),
    /// `*`: matches exactly one segment.
    SingleWildcard,
    /// `**`: matches one or more remaining segments.
    MultiWildcard,
    /// `{field.path=pattern}`: a named capture over `pattern`.
    Variable {
        field_path: Vec<String>,
        pattern: Vec<PathSegment>,
    },
}

/// A template segment with variables flattened away; what the trie is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKey {
    /// Decoded literal text.
    Literal(String),
    Single,
    Multi,
}

/// Where a variable span stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEnd {
    /// Exclusive segment index.
    At(usize),
    /// The span contains `**` and runs to the end of the request path.
    PathEnd,
}

/// The range of path segments bound to one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpan {
    pub field_path: Vec<String>,
    pub start: usize,
    pub end: SpanEnd,
}

/// The reason a template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("template must start with '/'")]
    MissingLeadingSlash,
    #[error("empty path segment")]
    EmptySegment,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated variable")]
    UnterminatedVariable,
    #[error("variables cannot be nested")]
    NestedVariable,
    #[error("invalid field path")]
    InvalidFieldPath,
    #[error("empty variable pattern")]
    EmptyPattern,
    #[error("'**' must be the last path segment")]
    MultiWildcardNotLast,
    #[error("empty custom verb")]
    EmptyVerb,
    #[error("duplicate variable '{0}'")]
    DuplicateVariable(String),
    #[error("literal does not decode: {0}")]
    InvalidEncoding(DecodeError),
}

/// A template that failed to compile, with the byte offset of the problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template `{template}` at position {position}: {kind}")]
pub struct ParseError {
    pub template: String,
    pub position: usize,
    pub kind: ParseErrorKind,
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<PathSegment>,
    verb: Option<String>,
    keys: Vec<SegmentKey>,
    variables: Vec<VariableSpan>,
}

impl Template {
    /// Compile a template string.
    pub fn parse(template: &str) -> Result<Self, ParseError> {
        let (segments, verb) = Parser::new(template).parse()?;
        let (keys, variables) = flatten(&segments);
        Ok(Self {
            segments,
            verb,
            keys,
            variables,
        })
    }

    /// Parsed segments in declaration order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The custom verb, if any.
    pub fn verb(&self) -> Option<&str> {
        self.verb.as_deref()
    }

    /// Trie keys, one per path segment the template consumes.
    pub fn keys(&self) -> &[SegmentKey] {
        &self.keys
    }

    /// Variable spans in declaration order.
    pub fn variables(&self) -> &[VariableSpan] {
        &self.variables
    }
}

impl FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Literal(text) => f.write_str(text),
            PathSegment::SingleWildcard => f.write_str("*"),
            PathSegment::MultiWildcard => f.write_str("**"),
            PathSegment::Variable { field_path, pattern } => {
                write!(f, "{{{}", field_path.join("."))?;
                if pattern.as_slice() != [PathSegment::SingleWildcard] {
                    f.write_str("=")?;
                    write_segments(f, pattern)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        write_segments(f, &self.segments)?;
        if let Some(verb) = &self.verb {
            write!(f, ":{}", verb)?;
        }
        Ok(())
    }
}

fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[PathSegment]) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            f.write_str("/")?;
        }
        write!(f, "{}", segment)?;
    }
    Ok(())
}

fn flatten(segments: &[PathSegment]) -> (Vec<SegmentKey>, Vec<VariableSpan>) {
    let mut keys = Vec::new();
    let mut variables = Vec::new();

    for segment in segments {
        match segment {
            PathSegment::Variable { field_path, pattern } => {
                let start = keys.len();
                for inner in pattern {
                    push_key(&mut keys, inner);
                }
                let end = if pattern.contains(&PathSegment::MultiWildcard) {
                    SpanEnd::PathEnd
                } else {
                    SpanEnd::At(keys.len())
                };
                variables.push(VariableSpan {
                    field_path: field_path.clone(),
                    start,
                    end,
                });
            }
            other => push_key(&mut keys, other),
        }
    }

    (keys, variables)
}

fn push_key(keys: &mut Vec<SegmentKey>, segment: &PathSegment) {
    match segment {
        // Literals were checked by the parser; the fallback is never taken.
        PathSegment::Literal(text) => keys.push(SegmentKey::Literal(
            decode_segment(text).map_or_else(|_| text.clone(), |decoded| decoded.into_owned()),
        )),
        PathSegment::SingleWildcard => keys.push(SegmentKey::Single),
        PathSegment::MultiWildcard => keys.push(SegmentKey::Multi),
        // The parser never nests variables.
        PathSegment::Variable { pattern, .. } => {
            for inner in pattern {
                push_key(keys, inner);
            }
        }
    }
}

/// Recursive-descent parser over the template text.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
    seen: HashSet<Vec<String>>,
    multi_at: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            seen: HashSet::new(),
            multi_at: None,
        }
    }

    fn parse(mut self) -> Result<(Vec<PathSegment>, Option<String>), ParseError> {
        if self.peek() != Some('/') {
            return Err(self.error(ParseErrorKind::MissingLeadingSlash));
        }
        self.bump();

        let mut segments = Vec::new();
        if self.peek().is_some() {
            loop {
                segments.push(self.parse_segment(false)?);
                match self.peek() {
                    Some('/') => self.bump(),
                    Some(':') | None => break,
                    Some(c) => return Err(self.error(ParseErrorKind::UnexpectedChar(c))),
                }
            }
        }

        let verb = if self.peek() == Some(':') {
            self.bump();
            let verb = self.parse_literal();
            if verb.is_empty() {
                return Err(self.error(ParseErrorKind::EmptyVerb));
            }
            Some(verb.to_string())
        } else {
            None
        };

        if let Some(c) = self.peek() {
            return Err(self.error(ParseErrorKind::UnexpectedChar(c)));
        }

        Ok((segments, verb))
    }

    fn parse_segment(&mut self, in_variable: bool) -> Result<PathSegment, ParseError> {
        if let Some(position) = self.multi_at {
            return Err(ParseError {
                template: self.src.to_string(),
                position,
                kind: ParseErrorKind::MultiWildcardNotLast,
            });
        }

        match self.peek() {
            Some('*') => {
                let start = self.pos;
                self.bump();
                if self.peek() == Some('*') {
                    self.bump();
                    self.multi_at = Some(start);
                    Ok(PathSegment::MultiWildcard)
                } else {
                    Ok(PathSegment::SingleWildcard)
                }
            }
            Some('{') if in_variable => Err(self.error(ParseErrorKind::NestedVariable)),
            Some('{') => self.parse_variable(),
            Some('}') if !in_variable => Err(self.error(ParseErrorKind::UnexpectedChar('}'))),
            Some(c @ ('?' | '#')) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            Some('/') | Some(':') | Some('}') | None => {
                Err(self.error(ParseErrorKind::EmptySegment))
            }
            Some(_) => {
                let start = self.pos;
                let literal = self.parse_literal();
                if let Err(err) = decode_segment(literal) {
                    let offset = match err {
                        DecodeError::InvalidEscape(at) => at,
                        DecodeError::InvalidUtf8 => 0,
                    };
                    return Err(ParseError {
                        template: self.src.to_string(),
                        position: start + offset,
                        kind: ParseErrorKind::InvalidEncoding(err),
                    });
                }
                Ok(PathSegment::Literal(literal.to_string()))
            }
        }
    }

    fn parse_variable(&mut self) -> Result<PathSegment, ParseError> {
        let start = self.pos;
        self.bump(); // '{'

        let field_path = self.parse_field_path()?;
        let pattern = match self.peek() {
            Some('}') => {
                self.bump();
                vec![PathSegment::SingleWildcard]
            }
            Some('=') => {
                self.bump();
                if self.peek() == Some('}') {
                    return Err(self.error(ParseErrorKind::EmptyPattern));
                }
                let mut pattern = Vec::new();
                loop {
                    pattern.push(self.parse_segment(true)?);
                    match self.peek() {
                        Some('/') => self.bump(),
                        Some('}') => {
                            self.bump();
                            break;
                        }
                        Some('{') => return Err(self.error(ParseErrorKind::NestedVariable)),
                        Some(c) => return Err(self.error(ParseErrorKind::UnexpectedChar(c))),
                        None => return Err(self.error(ParseErrorKind::UnterminatedVariable)),
                    }
                }
                pattern
            }
            Some('{') => return Err(self.error(ParseErrorKind::NestedVariable)),
            Some(_) => return Err(self.error(ParseErrorKind::InvalidFieldPath)),
            None => return Err(self.error(ParseErrorKind::UnterminatedVariable)),
        };

        if !self.seen.insert(field_path.clone()) {
            return Err(ParseError {
                template: self.src.to_string(),
                position: start,
                kind: ParseErrorKind::DuplicateVariable(field_path.join(".")),
            });
        }

        Ok(PathSegment::Variable {
            field_path,
            pattern,
        })
    }

    fn parse_field_path(&mut self) -> Result<Vec<String>, ParseError> {
        let mut components = Vec::new();
        loop {
            let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            if ident.is_empty() {
                return Err(self.error(ParseErrorKind::InvalidFieldPath));
            }
            components.push(ident.to_string());
            if self.peek() == Some('.') {
                self.bump();
            } else {
                return Ok(components);
            }
        }
    }

    fn parse_literal(&mut self) -> &'a str {
        self.take_while(|c| !RESERVED.contains(&c))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            template: self.src.to_string(),
            position: self.pos,
            kind,
        }
    }
}
