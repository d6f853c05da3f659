use crate::ast::{
    BinaryOperator, BoolOperator, CompareOperator, Expression, KeywordArgument, Literal, Program,
    Statement, UnaryOperator,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Token, TokenType};

// Binary operator tiers from `|` (loosest) down to `* / // % @`.
const BINARY_LEVELS: usize = 6;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.peek().token_type == TokenType::Newline {
                self.advance();
                continue;
            }

            statements.extend(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Vec<Statement>> {
        match &self.peek().token_type {
            TokenType::Def => Ok(vec![self.parse_function()?]),
            TokenType::If => Ok(vec![self.parse_if_statement()?]),
            TokenType::While => self.parse_while_loop(),
            TokenType::For => self.parse_for_loop(),
            TokenType::Indent => Err(ParseError::InvalidSyntax {
                message: "Unexpected indent".to_string(),
                location: self.peek().location(),
            }),
            // Decorator lines are dropped like any other unsupported statement
            TokenType::Keyword(_) | TokenType::At => Ok(vec![self.parse_unsupported_statement()]),
            _ => self.parse_simple_line(),
        }
    }

    /// One logical line of `;`-separated simple statements.
    fn parse_simple_line(&mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = vec![self.parse_simple_statement()?];

        while self.peek().token_type == TokenType::Semicolon {
            self.advance(); // consume ';'
            if matches!(self.peek().token_type, TokenType::Newline | TokenType::Eof) {
                break;
            }
            statements.push(self.parse_simple_statement()?);
        }

        match self.peek().token_type {
            TokenType::Newline => {
                self.advance();
            }
            TokenType::Eof | TokenType::Dedent => {}
            _ => return Err(self.unexpected("end of line")),
        }

        Ok(statements)
    }

    fn parse_simple_statement(&mut self) -> ParseResult<Statement> {
        match &self.peek().token_type {
            TokenType::Pass => {
                self.advance();
                Ok(Statement::Pass)
            }
            TokenType::Break => {
                self.advance();
                Ok(Statement::Break)
            }
            TokenType::Continue => {
                self.advance();
                Ok(Statement::Continue)
            }
            TokenType::Return => self.parse_return(),
            TokenType::Keyword(_) => {
                let start = self.current;
                while !matches!(
                    self.peek().token_type,
                    TokenType::Semicolon | TokenType::Newline | TokenType::Eof
                ) {
                    self.advance();
                }
                Ok(Statement::Unsupported {
                    text: self.source_text(start),
                })
            }
            _ => {
                let first = self.parse_expression_list()?;

                match self.peek().token_type {
                    TokenType::Colon => {
                        self.advance(); // consume ':'
                        self.parse_expression()?;
                        if self.peek().token_type != TokenType::Equal {
                            return Ok(Statement::Pass);
                        }
                        self.advance(); // consume '='
                        let value = self.parse_expression_list()?;
                        Ok(Statement::Assign {
                            targets: vec![first],
                            value,
                        })
                    }
                    TokenType::AugAssign(symbol) => {
                        let location = self.peek().location();
                        self.advance(); // consume 'op='
                        let operator = BinaryOperator::from_symbol(symbol).ok_or_else(|| {
                            ParseError::InvalidSyntax {
                                message: format!("Unknown augmented assignment '{}='", symbol),
                                location,
                            }
                        })?;
                        let value = self.parse_expression_list()?;
                        Ok(Statement::AugAssign {
                            target: first,
                            operator,
                            value,
                        })
                    }
                    TokenType::Equal => {
                        let mut targets = vec![first];
                        let mut value;
                        loop {
                            self.advance(); // consume '='
                            value = self.parse_expression_list()?;
                            if self.peek().token_type != TokenType::Equal {
                                break;
                            }
                            targets.push(value);
                        }
                        Ok(Statement::Assign { targets, value })
                    }
                    _ => Ok(Statement::Expression(first)),
                }
            }
        }
    }

    /// Consumes a statement led by a reserved word outside the subset, along
    /// with its indented block and any `except`/`finally`/`else` clauses.
    fn parse_unsupported_statement(&mut self) -> Statement {
        let start = self.current;
        self.skip_line();
        let text = self.source_text(start);

        loop {
            self.skip_indented_block();
            let continues = match &self.peek().token_type {
                TokenType::Keyword(word) => word == "except" || word == "finally",
                TokenType::Else => true,
                _ => false,
            };
            if !continues {
                break;
            }
            self.skip_line();
        }

        Statement::Unsupported { text }
    }

    fn skip_line(&mut self) {
        while !matches!(self.peek().token_type, TokenType::Newline | TokenType::Eof) {
            self.advance();
        }
        if self.peek().token_type == TokenType::Newline {
            self.advance();
        }
    }

    fn skip_indented_block(&mut self) {
        if self.peek().token_type != TokenType::Indent {
            return;
        }

        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek().token_type {
                TokenType::Indent => depth += 1,
                TokenType::Dedent => depth -= 1,
                _ => {}
            }
            self.advance();
            if depth == 0 {
                break;
            }
        }
    }

    /// Consumes tokens up to the closing bracket of the enclosing group,
    /// leaving that bracket in place.
    fn skip_to_closing_bracket(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.peek().token_type {
                TokenType::LeftParen | TokenType::LeftBracket | TokenType::LeftBrace => depth += 1,
                TokenType::RightParen | TokenType::RightBracket | TokenType::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Source text of the tokens from `start` up to the current position,
    /// with the original spacing collapsed to single spaces.
    fn source_text(&self, start: usize) -> String {
        let mut text = String::new();
        let mut previous_end: Option<(usize, usize)> = None;

        for token in &self.tokens[start..self.current] {
            if token.lexeme.is_empty() {
                continue;
            }
            if let Some((line, column)) = previous_end {
                if token.line != line || token.column > column {
                    text.push(' ');
                }
            }
            text.push_str(&token.lexeme);
            previous_end = Some((token.line, token.column + token.lexeme.chars().count()));
        }

        text
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.advance(); // consume 'return'

        if self.starts_expression() {
            Ok(Statement::Return(Some(self.parse_expression_list()?)))
        } else {
            Ok(Statement::Return(None))
        }
    }

    /// Parses `: NEWLINE INDENT stmts DEDENT` or a one-line body after the colon.
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect(TokenType::Colon, "':'")?;

        if self.peek().token_type != TokenType::Newline {
            return self.parse_simple_line();
        }
        self.advance(); // consume newline

        self.expect(TokenType::Indent, "an indented block")?;

        let mut body = Vec::new();
        while self.peek().token_type != TokenType::Dedent && !self.is_at_end() {
            if self.peek().token_type == TokenType::Newline {
                self.advance();
                continue;
            }
            body.extend(self.parse_statement()?);
        }

        if self.peek().token_type == TokenType::Dedent {
            self.advance(); // consume dedent
        }

        Ok(body)
    }

    fn parse_function(&mut self) -> ParseResult<Statement> {
        self.advance(); // consume 'def'

        let name = self.expect_identifier("function name")?;
        self.expect(TokenType::LeftParen, "'(' after function name")?;

        let mut params = Vec::new();
        while self.peek().token_type != TokenType::RightParen && !self.is_at_end() {
            if matches!(
                self.peek().token_type,
                TokenType::Star | TokenType::DoubleStar | TokenType::Slash
            ) {
                return Err(ParseError::NotImplemented {
                    feature: "Variadic or positional-only parameters".to_string(),
                    location: self.peek().location(),
                });
            }

            params.push(self.expect_identifier("parameter name")?);

            // Annotations and defaults are accepted but carry no meaning for the flowchart
            if self.peek().token_type == TokenType::Colon {
                self.advance();
                self.parse_expression()?;
            }
            if self.peek().token_type == TokenType::Equal {
                self.advance();
                self.parse_expression()?;
            }

            if self.peek().token_type == TokenType::Comma {
                self.advance(); // consume ','
            } else if self.peek().token_type != TokenType::RightParen {
                return Err(self.unexpected("',' or ')' in parameter list"));
            }
        }
        self.expect(TokenType::RightParen, "')' after parameters")?;

        if self.peek().token_type == TokenType::Arrow {
            self.advance(); // consume '->'
            self.parse_expression()?;
        }

        let body = self.parse_block()?;

        Ok(Statement::FunctionDef { name, params, body })
    }

    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        self.advance(); // consume 'if' or 'elif'

        let test = self.parse_expression()?;
        let body = self.parse_block()?;

        let orelse = match self.peek().token_type {
            TokenType::Elif => vec![self.parse_if_statement()?],
            TokenType::Else => {
                self.advance(); // consume 'else'
                self.parse_block()?
            }
            _ => Vec::new(),
        };

        Ok(Statement::If { test, body, orelse })
    }

    fn parse_while_loop(&mut self) -> ParseResult<Vec<Statement>> {
        self.advance(); // consume 'while'

        let test = self.parse_expression()?;
        let body = self.parse_block()?;

        let mut statements = vec![Statement::While { test, body }];
        statements.extend(self.parse_loop_else()?);
        Ok(statements)
    }

    fn parse_for_loop(&mut self) -> ParseResult<Vec<Statement>> {
        self.advance(); // consume 'for'

        let mut targets = vec![self.parse_binary(0)?];
        while self.peek().token_type == TokenType::Comma {
            self.advance(); // consume ','
            if self.peek().token_type == TokenType::In {
                break;
            }
            targets.push(self.parse_binary(0)?);
        }
        let target = if targets.len() == 1 {
            targets.remove(0)
        } else {
            Expression::Tuple(targets)
        };

        self.expect(TokenType::In, "'in' after for loop variable")?;
        let iter = self.parse_expression_list()?;
        let body = self.parse_block()?;

        let mut statements = vec![Statement::For { target, iter, body }];
        statements.extend(self.parse_loop_else()?);
        Ok(statements)
    }

    /// A loop's `else` clause has no flowchart form; its block is parsed and
    /// kept only as an unsupported marker.
    fn parse_loop_else(&mut self) -> ParseResult<Option<Statement>> {
        if self.peek().token_type != TokenType::Else {
            return Ok(None);
        }
        self.advance(); // consume 'else'
        self.parse_block()?;

        Ok(Some(Statement::Unsupported {
            text: "else:".to_string(),
        }))
    }

    /// Comma-separated expressions; more than one (or a trailing comma) forms a tuple.
    fn parse_expression_list(&mut self) -> ParseResult<Expression> {
        let first = self.parse_expression()?;
        if self.peek().token_type != TokenType::Comma {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.peek().token_type == TokenType::Comma {
            self.advance(); // consume ','
            if !self.starts_expression() {
                break;
            }
            items.push(self.parse_expression()?);
        }

        Ok(Expression::Tuple(items))
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        if let TokenType::Keyword(_) = &self.peek().token_type {
            return self.parse_unsupported_expression();
        }

        let body = self.parse_logical_or()?;

        if self.peek().token_type != TokenType::If {
            return Ok(body);
        }
        self.advance(); // consume 'if'
        let test = self.parse_logical_or()?;
        self.expect(TokenType::Else, "'else' in conditional expression")?;
        let orelse = self.parse_expression()?;

        Ok(Expression::Conditional {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    /// `lambda`, `yield` and `await` forms, kept as source text.
    fn parse_unsupported_expression(&mut self) -> ParseResult<Expression> {
        let start = self.current;

        if matches!(&self.peek().token_type, TokenType::Keyword(word) if word == "lambda") {
            while self.peek().token_type != TokenType::Colon && !self.is_at_end() {
                self.advance();
            }
            self.expect(TokenType::Colon, "':' in lambda")?;
            self.parse_expression()?;
        } else {
            while matches!(self.peek().token_type, TokenType::Keyword(_)) {
                self.advance(); // consume 'yield', 'await', 'from'
            }
            if self.starts_expression() {
                self.parse_expression()?;
            }
        }

        Ok(Expression::Unsupported(self.source_text(start)))
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expression> {
        let mut values = vec![self.parse_logical_and()?];

        while self.peek().token_type == TokenType::Or {
            self.advance(); // consume 'or'
            values.push(self.parse_logical_and()?);
        }

        Ok(Self::bool_op(BoolOperator::Or, values))
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expression> {
        let mut values = vec![self.parse_logical_not()?];

        while self.peek().token_type == TokenType::And {
            self.advance(); // consume 'and'
            values.push(self.parse_logical_not()?);
        }

        Ok(Self::bool_op(BoolOperator::And, values))
    }

    fn bool_op(operator: BoolOperator, mut values: Vec<Expression>) -> Expression {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Expression::BoolOp { operator, values }
        }
    }

    fn parse_logical_not(&mut self) -> ParseResult<Expression> {
        if self.peek().token_type == TokenType::Not {
            self.advance(); // consume 'not'
            let operand = self.parse_logical_not()?;
            return Ok(Expression::UnaryOp {
                operator: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let left = self.parse_binary(0)?;
        let mut comparisons = Vec::new();

        loop {
            let operator = match self.peek().token_type {
                TokenType::EqualEqual => CompareOperator::Equal,
                TokenType::NotEqual => CompareOperator::NotEqual,
                TokenType::Less => CompareOperator::Less,
                TokenType::LessEqual => CompareOperator::LessEqual,
                TokenType::Greater => CompareOperator::Greater,
                TokenType::GreaterEqual => CompareOperator::GreaterEqual,
                TokenType::In => CompareOperator::In,
                TokenType::Not if self.peek_next().token_type == TokenType::In => {
                    self.advance(); // consume 'not'
                    CompareOperator::NotIn
                }
                TokenType::Is if self.peek_next().token_type == TokenType::Not => {
                    self.advance(); // consume 'is'
                    CompareOperator::IsNot
                }
                TokenType::Is => CompareOperator::Is,
                _ => break,
            };
            self.advance(); // consume the (last) operator token
            comparisons.push((operator, self.parse_binary(0)?));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(Expression::Compare {
                left: Box::new(left),
                comparisons,
            })
        }
    }

    fn binary_operator(level: usize, token_type: &TokenType) -> Option<BinaryOperator> {
        let operator = match (level, token_type) {
            (0, TokenType::Pipe) => BinaryOperator::BitOr,
            (1, TokenType::Caret) => BinaryOperator::BitXor,
            (2, TokenType::Ampersand) => BinaryOperator::BitAnd,
            (3, TokenType::LeftShift) => BinaryOperator::LeftShift,
            (3, TokenType::RightShift) => BinaryOperator::RightShift,
            (4, TokenType::Plus) => BinaryOperator::Add,
            (4, TokenType::Minus) => BinaryOperator::Subtract,
            (5, TokenType::Star) => BinaryOperator::Multiply,
            (5, TokenType::Slash) => BinaryOperator::Divide,
            (5, TokenType::DoubleSlash) => BinaryOperator::FloorDivide,
            (5, TokenType::Percent) => BinaryOperator::Modulo,
            (5, TokenType::At) => BinaryOperator::MatMul,
            _ => return None,
        };
        Some(operator)
    }

    fn parse_binary(&mut self, level: usize) -> ParseResult<Expression> {
        if level == BINARY_LEVELS {
            return self.parse_unary();
        }

        let mut expr = self.parse_binary(level + 1)?;

        while let Some(operator) = Self::binary_operator(level, &self.peek().token_type) {
            self.advance(); // consume operator
            let right = self.parse_binary(level + 1)?;
            expr = Expression::BinaryOp {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let operator = match self.peek().token_type {
            TokenType::Minus => UnaryOperator::Negate,
            TokenType::Plus => UnaryOperator::Plus,
            TokenType::Tilde => UnaryOperator::Invert,
            _ => return self.parse_power(),
        };
        self.advance(); // consume operator

        let operand = self.parse_unary()?;
        Ok(Expression::UnaryOp {
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> ParseResult<Expression> {
        let base = self.parse_postfix()?;

        if self.peek().token_type != TokenType::DoubleStar {
            return Ok(base);
        }
        self.advance(); // consume '**'

        let exponent = self.parse_unary()?;
        Ok(Expression::BinaryOp {
            left: Box::new(base),
            operator: BinaryOperator::Power,
            right: Box::new(exponent),
        })
    }

    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek().token_type {
                TokenType::LeftParen => {
                    self.advance(); // consume '('
                    let (args, keywords) = self.parse_call_arguments()?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                        keywords,
                    };
                }
                TokenType::LeftBracket => {
                    self.advance(); // consume '['
                    let index = self.parse_subscript()?;
                    self.expect(TokenType::RightBracket, "']' after index")?;
                    expr = Expression::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenType::Dot => {
                    self.advance(); // consume '.'
                    let attribute = self.expect_identifier("attribute name after '.'")?;
                    expr = Expression::Attribute {
                        object: Box::new(expr),
                        attribute,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_call_arguments(&mut self) -> ParseResult<(Vec<Expression>, Vec<KeywordArgument>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while self.peek().token_type != TokenType::RightParen && !self.is_at_end() {
            let start = self.current;
            let unpacked = matches!(
                self.peek().token_type,
                TokenType::Star | TokenType::DoubleStar
            );
            let is_keyword = matches!(self.peek().token_type, TokenType::Identifier(_))
                && self.peek_next().token_type == TokenType::Equal;

            if unpacked {
                self.advance(); // consume '*' or '**'
                self.parse_expression()?;
                args.push(Expression::Unsupported(self.source_text(start)));
            } else if is_keyword {
                let name = self.expect_identifier("keyword name")?;
                self.advance(); // consume '='
                let value = self.parse_expression()?;
                keywords.push(KeywordArgument { name, value });
            } else {
                let arg = self.parse_expression()?;
                if self.peek().token_type == TokenType::For {
                    // Generator argument: `sum(x for x in xs)`
                    self.skip_to_closing_bracket();
                    args.push(Expression::Unsupported(self.source_text(start)));
                } else {
                    args.push(arg);
                }
            }

            if self.peek().token_type == TokenType::Comma {
                self.advance(); // consume ','
            } else if self.peek().token_type != TokenType::RightParen {
                return Err(self.unexpected("',' or ')' after function argument"));
            }
        }

        self.expect(TokenType::RightParen, "')' after function arguments")?;
        Ok((args, keywords))
    }

    fn parse_subscript(&mut self) -> ParseResult<Expression> {
        let first = self.parse_subscript_item()?;
        if self.peek().token_type != TokenType::Comma {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.peek().token_type == TokenType::Comma {
            self.advance(); // consume ','
            if self.peek().token_type == TokenType::RightBracket {
                break;
            }
            items.push(self.parse_subscript_item()?);
        }
        Ok(Expression::Tuple(items))
    }

    fn parse_subscript_item(&mut self) -> ParseResult<Expression> {
        let lower = if self.peek().token_type == TokenType::Colon {
            None
        } else {
            let expr = self.parse_expression()?;
            if self.peek().token_type != TokenType::Colon {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };

        self.advance(); // consume ':'
        let upper = self.parse_optional_slice_part()?;
        let step = if self.peek().token_type == TokenType::Colon {
            self.advance(); // consume ':'
            self.parse_optional_slice_part()?
        } else {
            None
        };

        Ok(Expression::Slice { lower, upper, step })
    }

    fn parse_optional_slice_part(&mut self) -> ParseResult<Option<Box<Expression>>> {
        if matches!(
            self.peek().token_type,
            TokenType::Colon | TokenType::RightBracket | TokenType::Comma
        ) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_expression()?)))
        }
    }

    fn parse_atom(&mut self) -> ParseResult<Expression> {
        let start = self.current;

        match self.peek().token_type.clone() {
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(name))
            }
            TokenType::Integer(value) => {
                self.advance();
                Ok(Expression::Literal(Literal::Integer(value)))
            }
            TokenType::Float(value) => {
                self.advance();
                Ok(Expression::Literal(Literal::Real(value)))
            }
            TokenType::True => {
                self.advance();
                Ok(Expression::Literal(Literal::Bool(true)))
            }
            TokenType::False => {
                self.advance();
                Ok(Expression::Literal(Literal::Bool(false)))
            }
            TokenType::NoneLiteral => {
                self.advance();
                Ok(Expression::Literal(Literal::None))
            }
            TokenType::String(_) | TokenType::FString(_) => Ok(self.parse_string_run()),
            TokenType::LeftParen => {
                self.advance(); // consume '('
                if self.peek().token_type == TokenType::RightParen {
                    self.advance();
                    return Ok(Expression::Tuple(Vec::new()));
                }
                let expr = self.parse_expression_list()?;
                if self.peek().token_type == TokenType::For {
                    self.skip_to_closing_bracket();
                    self.expect(TokenType::RightParen, "')' after generator expression")?;
                    return Ok(Expression::Unsupported(self.source_text(start)));
                }
                self.expect(TokenType::RightParen, "')'")?;
                Ok(expr)
            }
            TokenType::LeftBracket => {
                self.advance(); // consume '['
                let mut elements = Vec::new();

                while self.peek().token_type != TokenType::RightBracket && !self.is_at_end() {
                    elements.push(self.parse_expression()?);
                    if self.peek().token_type == TokenType::For {
                        self.skip_to_closing_bracket();
                        self.expect(TokenType::RightBracket, "']' after list comprehension")?;
                        return Ok(Expression::Unsupported(self.source_text(start)));
                    }
                    if self.peek().token_type == TokenType::Comma {
                        self.advance(); // consume ','
                    } else if self.peek().token_type != TokenType::RightBracket {
                        return Err(self.unexpected("',' or ']' in list literal"));
                    }
                }

                self.expect(TokenType::RightBracket, "']' after list elements")?;
                Ok(Expression::ListLiteral(elements))
            }
            TokenType::LeftBrace => {
                self.advance(); // consume '{'
                self.skip_to_closing_bracket();
                self.expect(TokenType::RightBrace, "'}' after dictionary or set")?;
                Ok(Expression::Unsupported(self.source_text(start)))
            }
            TokenType::Keyword(_) => self.parse_unsupported_expression(),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Adjacent string literals concatenate; any f-string in the run makes the
    /// whole run formatted.
    fn parse_string_run(&mut self) -> Expression {
        let mut text = String::new();
        let mut formatted = false;

        loop {
            match &self.peek().token_type {
                TokenType::String(value) => text.push_str(value),
                TokenType::FString(value) => {
                    formatted = true;
                    text.push_str(value);
                }
                _ => break,
            }
            self.advance();
        }

        if formatted {
            Expression::FormattedString(text)
        } else {
            Expression::Literal(Literal::Str(text))
        }
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Identifier(_)
                | TokenType::Integer(_)
                | TokenType::Float(_)
                | TokenType::String(_)
                | TokenType::FString(_)
                | TokenType::True
                | TokenType::False
                | TokenType::NoneLiteral
                | TokenType::Not
                | TokenType::Minus
                | TokenType::Plus
                | TokenType::Tilde
                | TokenType::LeftParen
                | TokenType::LeftBracket
                | TokenType::LeftBrace
        )
    }

    fn expect(&mut self, token_type: TokenType, expected: &str) -> ParseResult<&Token> {
        if self.peek().token_type == token_type {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> ParseResult<String> {
        match &self.peek().token_type {
            TokenType::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.token_type == TokenType::Eof {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
                location: token.location(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: describe(&token.token_type),
                location: token.location(),
            }
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }
}

fn describe(token_type: &TokenType) -> String {
    match token_type {
        TokenType::Identifier(name) => format!("identifier '{}'", name),
        TokenType::Keyword(word) => format!("keyword '{}'", word),
        TokenType::Integer(n) => format!("number {}", n),
        TokenType::Float(r) => format!("number {}", r),
        TokenType::String(_) | TokenType::FString(_) => "string literal".to_string(),
        TokenType::Newline => "end of line".to_string(),
        TokenType::Indent => "indent".to_string(),
        TokenType::Dedent => "dedent".to_string(),
        TokenType::Eof => "end of file".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use indoc::indoc;

    fn parse_program_from_string(input: &str) -> ParseResult<Program> {
        let tokens = Lexer::new(input).tokenize().unwrap();
        Parser::new(tokens).parse()
    }

    fn parse_statement_from_string(input: &str) -> Statement {
        let mut program = parse_program_from_string(input).unwrap();
        assert_eq!(program.statements.len(), 1);
        program.statements.remove(0)
    }

    fn parse_expression_from_string(input: &str) -> Expression {
        match parse_statement_from_string(input) {
            Statement::Expression(expr) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_parsing() {
        match parse_statement_from_string("x = 5") {
            Statement::Assign { targets, value } => {
                assert_eq!(targets, vec![Expression::name("x")]);
                assert_eq!(value, Expression::int(5));
            }
            _ => panic!("Expected Assign statement"),
        }
    }

    #[test]
    fn test_chained_assignment_targets() {
        match parse_statement_from_string("a = b = 0") {
            Statement::Assign { targets, value } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(value, Expression::int(0));
            }
            _ => panic!("Expected Assign statement"),
        }
    }

    #[test]
    fn test_indexed_assignment_parsing() {
        match parse_statement_from_string("arr[i + 1] = 3") {
            Statement::Assign { targets, .. } => match &targets[0] {
                Expression::Index { base, index } => {
                    assert_eq!(**base, Expression::name("arr"));
                    assert_eq!(index.to_string(), "i + 1");
                }
                _ => panic!("Expected Index target"),
            },
            _ => panic!("Expected Assign statement"),
        }
    }

    #[test]
    fn test_augmented_assignment_parsing() {
        match parse_statement_from_string("total += x") {
            Statement::AugAssign { operator, .. } => assert_eq!(operator, BinaryOperator::Add),
            _ => panic!("Expected AugAssign statement"),
        }
    }

    #[test]
    fn test_if_elif_else_parsing() {
        let input = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
        match parse_statement_from_string(input) {
            Statement::If { body, orelse, .. } => {
                assert_eq!(body.len(), 1);
                assert_eq!(orelse.len(), 1);
                match &orelse[0] {
                    Statement::If { orelse, .. } => assert_eq!(orelse.len(), 1),
                    _ => panic!("Expected nested If for elif"),
                }
            }
            _ => panic!("Expected If statement"),
        }
    }

    #[test]
    fn test_for_loop_parsing() {
        match parse_statement_from_string("for i in range(10, 0, -2):\n    print(i)\n") {
            Statement::For { target, iter, body } => {
                assert_eq!(target, Expression::name("i"));
                assert_eq!(iter.callee_name(), Some("range"));
                assert_eq!(body.len(), 1);
            }
            _ => panic!("Expected For statement"),
        }
    }

    #[test]
    fn test_function_parsing_discards_annotations() {
        let input = "def add(a: int, b=2) -> int:\n    return a + b\n";
        match parse_statement_from_string(input) {
            Statement::FunctionDef { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(body[0], Statement::Return(Some(_))));
            }
            _ => panic!("Expected FunctionDef statement"),
        }
    }

    #[test]
    fn test_one_line_block_and_semicolons() {
        let program = parse_program_from_string("while x: x = x - 1; print(x)\n").unwrap();
        match &program.statements[0] {
            Statement::While { body, .. } => assert_eq!(body.len(), 2),
            _ => panic!("Expected While statement"),
        }
    }

    #[test]
    fn test_chained_comparison_parsing() {
        match parse_expression_from_string("a < b < c") {
            Expression::Compare { comparisons, .. } => {
                assert_eq!(comparisons.len(), 2);
                assert_eq!(comparisons[1].0, CompareOperator::Less);
            }
            _ => panic!("Expected Compare expression"),
        }
    }

    #[test]
    fn test_not_in_and_is_not() {
        match parse_expression_from_string("a not in b is not c") {
            Expression::Compare { comparisons, .. } => {
                assert_eq!(comparisons[0].0, CompareOperator::NotIn);
                assert_eq!(comparisons[1].0, CompareOperator::IsNot);
            }
            _ => panic!("Expected Compare expression"),
        }
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(parse_expression_from_string("f(1 + 2 * 3)").to_string(), "f(1 + 2 * 3)");
        assert_eq!(parse_expression_from_string("f((1 + 2) * 3)").to_string(), "f((1 + 2) * 3)");
        match parse_expression_from_string("f(-2 ** 2)") {
            Expression::Call { args, .. } => match &args[0] {
                Expression::UnaryOp { operator, operand } => {
                    assert_eq!(*operator, UnaryOperator::Negate);
                    assert!(matches!(
                        operand.as_ref(),
                        Expression::BinaryOp {
                            operator: BinaryOperator::Power,
                            ..
                        }
                    ));
                }
                _ => panic!("Expected unary negation"),
            },
            _ => panic!("Expected Call expression"),
        }
    }

    #[test]
    fn test_keyword_arguments() {
        match parse_expression_from_string("print(\"a\", end=\"\")") {
            Expression::Call { args, keywords, .. } => {
                assert_eq!(args.len(), 1);
                assert_eq!(keywords[0].name, "end");
            }
            _ => panic!("Expected Call expression"),
        }
    }

    #[test]
    fn test_slice_and_attribute() {
        assert_eq!(parse_expression_from_string("items.count(x[1:3])").to_string(), "items.count(x[1:3])");
    }

    fn assigned_value(input: &str) -> Expression {
        match parse_statement_from_string(input) {
            Statement::Assign { value, .. } => value,
            other => panic!("Expected Assign statement, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_statements_are_kept_as_text() {
        let program = parse_program_from_string("import math\nfrom os import path\nx = 1\n").unwrap();
        assert_eq!(
            program.statements,
            vec![
                Statement::Unsupported {
                    text: "import math".to_string()
                },
                Statement::Unsupported {
                    text: "from os import path".to_string()
                },
                Statement::Assign {
                    targets: vec![Expression::name("x")],
                    value: Expression::int(1),
                },
            ]
        );
    }

    #[test]
    fn test_unsupported_blocks_are_consumed() {
        let input = indoc! {"
            class Point:
                def __init__(self):
                    self.x = 0
            try:
                y = 1
            except ValueError as err:
                y = 2
            finally:
                pass
            @cache
            def f():
                return 1
            print(y)
        "};
        let program = parse_program_from_string(input).unwrap();
        assert_eq!(program.statements.len(), 5);
        assert_eq!(
            program.statements[0],
            Statement::Unsupported {
                text: "class Point:".to_string()
            }
        );
        assert_eq!(
            program.statements[1],
            Statement::Unsupported {
                text: "try:".to_string()
            }
        );
        assert!(matches!(&program.statements[2], Statement::Unsupported { text } if text == "@cache"));
        assert!(matches!(&program.statements[3], Statement::FunctionDef { name, .. } if name == "f"));
        assert!(matches!(&program.statements[4], Statement::Expression(_)));
    }

    #[test]
    fn test_unsupported_expressions_are_kept_as_text() {
        assert_eq!(
            assigned_value("d = {'a': 1, 'b': [2, 3]}"),
            Expression::Unsupported("{'a': 1, 'b': [2, 3]}".to_string())
        );
        assert_eq!(
            assigned_value("s = {1, 2}"),
            Expression::Unsupported("{1, 2}".to_string())
        );
        assert_eq!(
            assigned_value("ys = [i * 2 for i in xs if i]"),
            Expression::Unsupported("[i * 2 for i in xs if i]".to_string())
        );
        assert_eq!(
            assigned_value("f = lambda v: v + 1"),
            Expression::Unsupported("lambda v: v + 1".to_string())
        );
        match assigned_value("t = sum(x for x in xs)") {
            Expression::Call { args, .. } => {
                assert_eq!(args, vec![Expression::Unsupported("x for x in xs".to_string())]);
            }
            other => panic!("Expected Call expression, got {:?}", other),
        }
    }

    #[test]
    fn test_annotated_assignment() {
        assert_eq!(assigned_value("x: int = 5"), Expression::int(5));
        assert_eq!(parse_statement_from_string("x: int"), Statement::Pass);
    }

    #[test]
    fn test_loop_else_follows_loop() {
        let program = parse_program_from_string("while x:\n    pass\nelse:\n    y = 1\n").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0], Statement::While { .. }));
        assert!(matches!(program.statements[1], Statement::Unsupported { .. }));
    }

    #[test]
    fn test_variadic_parameters_are_errors() {
        assert!(matches!(
            parse_program_from_string("def f(*args):\n    pass\n"),
            Err(ParseError::NotImplemented { .. })
        ));
    }

    #[test]
    fn test_missing_colon_reports_location() {
        let err = parse_program_from_string("x = 1\nif x\n    y = 2\n").unwrap_err();
        match err {
            ParseError::UnexpectedToken { location, .. } => assert_eq!(location.line, 2),
            other => panic!("Expected UnexpectedToken, got {:?}", other),
        }
    }
}
