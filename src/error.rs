use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// Parser Errors
#[derive(Debug)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: String,
        location: SourceLocation,
    },
    UnexpectedEof {
        expected: String,
        location: SourceLocation,
    },
    InvalidSyntax {
        message: String,
        location: SourceLocation,
    },
    NotImplemented {
        feature: String,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::UnexpectedEof { location, .. }
            | ParseError::InvalidSyntax { location, .. }
            | ParseError::NotImplemented { location, .. } => *location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                location,
            } => write!(f, "{}: Expected {}, found {}", location, expected, found),
            ParseError::UnexpectedEof { expected, location } => {
                write!(f, "{}: Unexpected end of file, expected {}", location, expected)
            }
            ParseError::InvalidSyntax { message, location } => write!(f, "{}: {}", location, message),
            ParseError::NotImplemented { feature, location } => {
                write!(f, "{}: {} is not supported", location, feature)
            }
        }
    }
}

impl std::error::Error for ParseError {}

// Lexer Errors
#[derive(Debug)]
pub enum LexError {
    UnexpectedCharacter {
        character: char,
        location: SourceLocation,
    },
    UnterminatedString {
        location: SourceLocation,
    },
    InconsistentIndentation {
        location: SourceLocation,
    },
    InvalidNumber {
        value: String,
        location: SourceLocation,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LexError::UnexpectedCharacter {
                character,
                location,
            } => {
                write!(f, "{}: Unexpected character '{}'", location, character)
            }
            LexError::UnterminatedString { location } => {
                write!(f, "{}: Unterminated string literal", location)
            }
            LexError::InconsistentIndentation { location } => {
                write!(f, "{}: Unindent does not match any outer indentation level", location)
            }
            LexError::InvalidNumber { value, location } => {
                write!(f, "{}: Invalid number '{}'", location, value)
            }
        }
    }
}

impl std::error::Error for LexError {}

// Conversion Errors
#[derive(Debug)]
pub enum ConvertError {
    LexError(LexError),
    ParseError(ParseError),
    SerializeError(serde_json::Error),
    InputError {
        path: String,
        source: std::io::Error,
    },
    OutputError {
        path: String,
        source: std::io::Error,
    },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConvertError::LexError(e) => write!(f, "Lexical error: {}", e),
            ConvertError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConvertError::SerializeError(e) => write!(f, "Serialization error: {}", e),
            ConvertError::InputError { path, source } => {
                write!(f, "Error reading input file '{}': {}", path, source)
            }
            ConvertError::OutputError { path, source } => {
                write!(f, "Error writing output file '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::LexError(e) => Some(e),
            ConvertError::ParseError(e) => Some(e),
            ConvertError::SerializeError(e) => Some(e),
            ConvertError::InputError { source, .. } | ConvertError::OutputError { source, .. } => {
                Some(source)
            }
        }
    }
}

impl From<ParseError> for ConvertError {
    fn from(err: ParseError) -> Self {
        ConvertError::ParseError(err)
    }
}

impl From<LexError> for ConvertError {
    fn from(err: LexError) -> Self {
        ConvertError::LexError(err)
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::SerializeError(err)
    }
}

// Result types
pub type ParseResult<T> = Result<T, ParseError>;
pub type LexResult<T> = Result<T, LexError>;
pub type ConvertResult<T> = Result<T, ConvertError>;
