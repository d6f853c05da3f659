use crate::error::{LexError, LexResult, SourceLocation};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Def,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Not,
    And,
    Or,
    Is,
    Pass,
    Break,
    Continue,
    True,
    False,
    NoneLiteral,
    // Reserved words outside the supported subset (class, import, lambda, ...)
    Keyword(String),
    Identifier(String),
    String(String),
    FString(String),
    Integer(i64),
    Float(f64),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    At,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    LeftShift,
    RightShift,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    AugAssign(&'static str), // "+" for +=, "//" for //=, ...
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Arrow,
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text of the token; empty for layout tokens.
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

const RESERVED: &[&str] = &[
    "as", "assert", "async", "await", "class", "del", "except", "finally", "from", "global",
    "import", "lambda", "nonlocal", "raise", "try", "with", "yield",
];

fn keyword(word: &str) -> Option<TokenType> {
    let token_type = match word {
        "def" => TokenType::Def,
        "return" => TokenType::Return,
        "if" => TokenType::If,
        "elif" => TokenType::Elif,
        "else" => TokenType::Else,
        "while" => TokenType::While,
        "for" => TokenType::For,
        "in" => TokenType::In,
        "not" => TokenType::Not,
        "and" => TokenType::And,
        "or" => TokenType::Or,
        "is" => TokenType::Is,
        "pass" => TokenType::Pass,
        "break" => TokenType::Break,
        "continue" => TokenType::Continue,
        "True" => TokenType::True,
        "False" => TokenType::False,
        "None" => TokenType::NoneLiteral,
        _ if RESERVED.contains(&word) => TokenType::Keyword(word.to_string()),
        _ => return None,
    };
    Some(token_type)
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    paren_depth: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            paren_depth: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut at_line_start = true;

        while !self.is_at_end() {
            if at_line_start && self.paren_depth == 0 {
                let width = self.measure_indent();
                match self.current_char() {
                    '\n' => {
                        self.advance();
                        continue;
                    }
                    '\r' => {
                        self.advance();
                        continue;
                    }
                    '#' => {
                        self.skip_comment();
                        continue;
                    }
                    _ if self.is_at_end() => break,
                    _ => {}
                }
                self.handle_indent(width)?;
                at_line_start = false;
            }

            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            match self.current_char() {
                '#' => self.skip_comment(),
                '\n' => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    if self.paren_depth == 0 {
                        self.push(TokenType::Newline, line, column);
                        at_line_start = true;
                    }
                }
                _ => {
                    let token = self.next_token()?;
                    self.tokens.push(token);
                }
            }
        }

        let (line, column) = (self.line, self.column);
        if !matches!(
            self.tokens.last().map(|t| &t.token_type),
            None | Some(TokenType::Newline)
        ) {
            self.push(TokenType::Newline, line, column);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenType::Dedent, line, column);
        }
        self.push(TokenType::Eof, line, column);

        Ok(self.tokens)
    }

    fn push(&mut self, token_type: TokenType, line: usize, column: usize) {
        self.tokens.push(Token {
            token_type,
            lexeme: String::new(),
            line,
            column,
        });
    }

    fn measure_indent(&mut self) -> usize {
        let mut width = 0;
        while !self.is_at_end() {
            match self.current_char() {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }
        width
    }

    fn handle_indent(&mut self, width: usize) -> LexResult<()> {
        let (line, column) = (self.line, self.column);
        let current = self.indent_stack.last().copied().unwrap_or(0);

        if width > current {
            self.indent_stack.push(width);
            self.push(TokenType::Indent, line, column);
        } else if width < current {
            while self.indent_stack.len() > 1 && width < self.indent_stack.last().copied().unwrap_or(0) {
                self.indent_stack.pop();
                self.push(TokenType::Dedent, line, column);
            }
            if self.indent_stack.last().copied().unwrap_or(0) != width {
                return Err(LexError::InconsistentIndentation {
                    location: SourceLocation::new(line, column),
                });
            }
        }

        Ok(())
    }

    fn next_token(&mut self) -> LexResult<Token> {
        let start = self.position;
        let line = self.line;
        let column = self.column;
        let location = SourceLocation::new(line, column);

        let ch = self.current_char();

        let token_type = match ch {
            '"' | '\'' => self.read_string(false, false, location)?,
            _ if ch.is_alphabetic() || ch == '_' => {
                if let Some((raw, formatted, prefix_len)) = self.string_prefix() {
                    for _ in 0..prefix_len {
                        self.advance();
                    }
                    self.read_string(raw, formatted, location)?
                } else {
                    self.read_identifier()
                }
            }
            _ if ch.is_ascii_digit() => self.read_number(location)?,
            '.' if self.peek_char(1).is_ascii_digit() => self.read_number(location)?,
            '(' | '[' | '{' => {
                self.advance();
                self.paren_depth += 1;
                match ch {
                    '(' => TokenType::LeftParen,
                    '[' => TokenType::LeftBracket,
                    _ => TokenType::LeftBrace,
                }
            }
            ')' | ']' | '}' => {
                self.advance();
                self.paren_depth = self.paren_depth.saturating_sub(1);
                match ch {
                    ')' => TokenType::RightParen,
                    ']' => TokenType::RightBracket,
                    _ => TokenType::RightBrace,
                }
            }
            ',' => {
                self.advance();
                TokenType::Comma
            }
            ':' => {
                self.advance();
                TokenType::Colon
            }
            ';' => {
                self.advance();
                TokenType::Semicolon
            }
            '.' => {
                self.advance();
                TokenType::Dot
            }
            '~' => {
                self.advance();
                TokenType::Tilde
            }
            '+' => self.operator('+', TokenType::Plus),
            '%' => self.operator('%', TokenType::Percent),
            '@' => self.operator('@', TokenType::At),
            '&' => self.operator('&', TokenType::Ampersand),
            '|' => self.operator('|', TokenType::Pipe),
            '^' => self.operator('^', TokenType::Caret),
            '-' => {
                if self.peek_char(1) == '>' {
                    self.advance();
                    self.advance();
                    TokenType::Arrow
                } else {
                    self.operator('-', TokenType::Minus)
                }
            }
            '*' => {
                if self.peek_char(1) == '*' {
                    self.advance();
                    self.operator('*', TokenType::DoubleStar)
                } else {
                    self.operator('*', TokenType::Star)
                }
            }
            '/' => {
                if self.peek_char(1) == '/' {
                    self.advance();
                    self.operator('/', TokenType::DoubleSlash)
                } else {
                    self.operator('/', TokenType::Slash)
                }
            }
            '<' => match self.peek_char(1) {
                '<' => {
                    self.advance();
                    self.operator('<', TokenType::LeftShift)
                }
                '=' => {
                    self.advance();
                    self.advance();
                    TokenType::LessEqual
                }
                _ => {
                    self.advance();
                    TokenType::Less
                }
            },
            '>' => match self.peek_char(1) {
                '>' => {
                    self.advance();
                    self.operator('>', TokenType::RightShift)
                }
                '=' => {
                    self.advance();
                    self.advance();
                    TokenType::GreaterEqual
                }
                _ => {
                    self.advance();
                    TokenType::Greater
                }
            },
            '=' => {
                self.advance();
                if self.current_char() == '=' {
                    self.advance();
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                }
            }
            '!' if self.peek_char(1) == '=' => {
                self.advance();
                self.advance();
                TokenType::NotEqual
            }
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    location,
                })
            }
        };

        Ok(Token {
            token_type,
            lexeme: self.input[start..self.position].iter().collect(),
            line,
            column,
        })
    }

    /// Consumes the last character of an operator and folds a trailing '='
    /// into an augmented assignment.
    fn operator(&mut self, last: char, plain: TokenType) -> TokenType {
        self.advance();
        if self.current_char() != '=' {
            return plain;
        }
        self.advance();
        let symbol = match (&plain, last) {
            (TokenType::DoubleStar, _) => "**",
            (TokenType::DoubleSlash, _) => "//",
            (TokenType::LeftShift, _) => "<<",
            (TokenType::RightShift, _) => ">>",
            (_, '+') => "+",
            (_, '-') => "-",
            (_, '*') => "*",
            (_, '/') => "/",
            (_, '%') => "%",
            (_, '@') => "@",
            (_, '&') => "&",
            (_, '|') => "|",
            _ => "^",
        };
        TokenType::AugAssign(symbol)
    }

    /// Recognizes string prefixes such as `r`, `f`, `rb` directly followed by a quote.
    fn string_prefix(&self) -> Option<(bool, bool, usize)> {
        let mut raw = false;
        let mut formatted = false;
        let mut len = 0;

        while len < 2 {
            match self.peek_char(len).to_ascii_lowercase() {
                'r' if !raw => raw = true,
                'f' if !formatted => formatted = true,
                'b' | 'u' => {}
                _ => break,
            }
            len += 1;
        }

        if len > 0 && matches!(self.peek_char(len), '"' | '\'') {
            Some((raw, formatted, len))
        } else {
            None
        }
    }

    fn read_string(
        &mut self,
        raw: bool,
        formatted: bool,
        location: SourceLocation,
    ) -> LexResult<TokenType> {
        let quote = self.current_char();
        let triple = self.peek_char(1) == quote && self.peek_char(2) == quote;
        let quote_len = if triple { 3 } else { 1 };
        for _ in 0..quote_len {
            self.advance();
        }

        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(LexError::UnterminatedString { location });
            }
            let ch = self.current_char();

            if ch == quote
                && (!triple || (self.peek_char(1) == quote && self.peek_char(2) == quote))
            {
                for _ in 0..quote_len {
                    self.advance();
                }
                break;
            }

            if ch == '\n' && !triple {
                return Err(LexError::UnterminatedString { location });
            }

            if ch == '\\' && !raw {
                self.advance();
                if self.is_at_end() {
                    return Err(LexError::UnterminatedString { location });
                }
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\n' => {}
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                self.advance();
                continue;
            }

            if ch == '\\' && raw {
                // raw strings still cannot end on an escaped quote
                value.push(ch);
                self.advance();
                if !self.is_at_end() {
                    value.push(self.current_char());
                    self.advance();
                }
                continue;
            }

            value.push(ch);
            self.advance();
        }

        if formatted {
            Ok(TokenType::FString(value))
        } else {
            Ok(TokenType::String(value))
        }
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_at_end() && (self.current_char().is_alphanumeric() || self.current_char() == '_') {
            value.push(self.current_char());
            self.advance();
        }

        keyword(&value).unwrap_or(TokenType::Identifier(value))
    }

    fn read_number(&mut self, location: SourceLocation) -> LexResult<TokenType> {
        let mut value = String::new();

        if self.current_char() == '0' && matches!(self.peek_char(1), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            let radix = match self.peek_char(1).to_ascii_lowercase() {
                'x' => 16,
                'o' => 8,
                _ => 2,
            };
            self.advance();
            self.advance();
            while !self.is_at_end() && (self.current_char().is_ascii_alphanumeric() || self.current_char() == '_') {
                value.push(self.current_char());
                self.advance();
            }
            let digits: String = value.chars().filter(|c| *c != '_').collect();
            return i64::from_str_radix(&digits, radix)
                .map(TokenType::Integer)
                .map_err(|_| LexError::InvalidNumber { value, location });
        }

        let mut is_float = false;
        self.read_digits(&mut value);

        if self.current_char() == '.' && !self.peek_char(1).is_alphabetic() && self.peek_char(1) != '_' {
            is_float = true;
            value.push('.');
            self.advance();
            self.read_digits(&mut value);
        }

        if matches!(self.current_char(), 'e' | 'E')
            && (self.peek_char(1).is_ascii_digit()
                || (matches!(self.peek_char(1), '+' | '-') && self.peek_char(2).is_ascii_digit()))
        {
            is_float = true;
            value.push('e');
            self.advance();
            if matches!(self.current_char(), '+' | '-') {
                value.push(self.current_char());
                self.advance();
            }
            self.read_digits(&mut value);
        }

        let cleaned: String = value.chars().filter(|c| *c != '_').collect();
        if is_float {
            cleaned
                .parse::<f64>()
                .map(TokenType::Float)
                .map_err(|_| LexError::InvalidNumber { value, location })
        } else {
            cleaned
                .parse::<i64>()
                .map(TokenType::Integer)
                .map_err(|_| LexError::InvalidNumber { value, location })
        }
    }

    fn read_digits(&mut self, value: &mut String) {
        while !self.is_at_end() && (self.current_char().is_ascii_digit() || self.current_char() == '_') {
            value.push(self.current_char());
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.current_char() {
                ' ' | '\r' | '\t' | '\x0c' => self.advance(),
                '\\' if self.peek_char(1) == '\n' => {
                    self.advance();
                    self.advance();
                }
                '\\' if self.peek_char(1) == '\r' && self.peek_char(2) == '\n' => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while !self.is_at_end() && self.current_char() != '\n' {
            self.advance();
        }
    }

    fn current_char(&self) -> char {
        self.peek_char(0)
    }

    fn peek_char(&self, offset: usize) -> char {
        self.input.get(self.position + offset).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            if self.current_char() == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
