use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Str(String),
    Bool(bool),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    MatMul,
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::FloorDivide => "//",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
            BinaryOperator::MatMul => "@",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let operator = match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "//" => BinaryOperator::FloorDivide,
            "%" => BinaryOperator::Modulo,
            "**" => BinaryOperator::Power,
            "@" => BinaryOperator::MatMul,
            "&" => BinaryOperator::BitAnd,
            "|" => BinaryOperator::BitOr,
            "^" => BinaryOperator::BitXor,
            "<<" => BinaryOperator::LeftShift,
            ">>" => BinaryOperator::RightShift,
            _ => return None,
        };
        Some(operator)
    }

    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::BitOr => precedence::BIT_OR,
            BinaryOperator::BitXor => precedence::BIT_XOR,
            BinaryOperator::BitAnd => precedence::BIT_AND,
            BinaryOperator::LeftShift | BinaryOperator::RightShift => precedence::SHIFT,
            BinaryOperator::Add | BinaryOperator::Subtract => precedence::ARITH,
            BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::FloorDivide
            | BinaryOperator::Modulo
            | BinaryOperator::MatMul => precedence::TERM,
            BinaryOperator::Power => precedence::POWER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperator::Equal => "==",
            CompareOperator::NotEqual => "!=",
            CompareOperator::Less => "<",
            CompareOperator::LessEqual => "<=",
            CompareOperator::Greater => ">",
            CompareOperator::GreaterEqual => ">=",
            CompareOperator::In => "in",
            CompareOperator::NotIn => "not in",
            CompareOperator::Is => "is",
            CompareOperator::IsNot => "is not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
    Invert,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "not ",
            UnaryOperator::Invert => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

impl BoolOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            BoolOperator::And => "and",
            BoolOperator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordArgument {
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Compare {
        left: Box<Expression>,
        comparisons: Vec<(CompareOperator, Expression)>,
    },
    BoolOp {
        operator: BoolOperator,
        values: Vec<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        keywords: Vec<KeywordArgument>,
    },
    ListLiteral(Vec<Expression>),
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Attribute {
        object: Box<Expression>,
        attribute: String,
    },
    Conditional {
        test: Box<Expression>,
        body: Box<Expression>,
        orelse: Box<Expression>,
    },
    Tuple(Vec<Expression>),
    Slice {
        lower: Option<Box<Expression>>,
        upper: Option<Box<Expression>>,
        step: Option<Box<Expression>>,
    },
    FormattedString(String),
    /// Dict/set literals, comprehensions, lambdas and similar forms, kept as
    /// their source text.
    Unsupported(String),
}

/// Binding strength of each expression form, loosest first.
pub mod precedence {
    pub const TUPLE: u8 = 0;
    pub const CONDITIONAL: u8 = 1;
    pub const OR: u8 = 2;
    pub const AND: u8 = 3;
    pub const NOT: u8 = 4;
    pub const COMPARE: u8 = 5;
    pub const BIT_OR: u8 = 6;
    pub const BIT_XOR: u8 = 7;
    pub const BIT_AND: u8 = 8;
    pub const SHIFT: u8 = 9;
    pub const ARITH: u8 = 10;
    pub const TERM: u8 = 11;
    pub const UNARY: u8 = 12;
    pub const POWER: u8 = 13;
    pub const ATOM: u8 = 14;
}

impl Expression {
    pub fn name(name: &str) -> Self {
        Expression::Identifier(name.to_string())
    }

    pub fn int(value: i64) -> Self {
        Expression::Literal(Literal::Integer(value))
    }

    pub fn string(value: &str) -> Self {
        Expression::Literal(Literal::Str(value.to_string()))
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(Expression::name(name)),
            args,
            keywords: Vec::new(),
        }
    }

    /// Name of the called function when the callee is a plain identifier.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            Expression::Call { callee, .. } => match callee.as_ref() {
                Expression::Identifier(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            Expression::Tuple(_) | Expression::Slice { .. } => precedence::TUPLE,
            Expression::Conditional { .. } => precedence::CONDITIONAL,
            Expression::BoolOp {
                operator: BoolOperator::Or,
                ..
            } => precedence::OR,
            Expression::BoolOp {
                operator: BoolOperator::And,
                ..
            } => precedence::AND,
            Expression::UnaryOp {
                operator: UnaryOperator::Not,
                ..
            } => precedence::NOT,
            Expression::Compare { .. } => precedence::COMPARE,
            Expression::BinaryOp { operator, .. } => operator.precedence(),
            Expression::UnaryOp { .. } => precedence::UNARY,
            Expression::Literal(Literal::Integer(n)) if *n < 0 => precedence::UNARY,
            Expression::Literal(Literal::Real(r)) if *r < 0.0 => precedence::UNARY,
            _ => precedence::ATOM,
        }
    }
}

/// Renders a float the way Python's `repr()` does: shortest round-trip
/// digits, switching to exponent form below 1e-4 and from 1e16 up.
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }

    let scientific = format!("{:e}", value);
    if let Some((mantissa, exponent)) = scientific.split_once('e') {
        if let Ok(exponent) = exponent.parse::<i32>() {
            if !(-4..16).contains(&exponent) {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
            }
        }
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Real(r) => write!(f, "{}", format_real(*r)),
            Literal::Str(s) => write!(f, "\"{}\"", s),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::None => write!(f, "None"),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter, expr: &Expression, min_precedence: u8) -> fmt::Result {
    if expr.precedence() < min_precedence {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_list(f: &mut fmt::Formatter, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_operand(f, item, precedence::CONDITIONAL)?;
    }
    Ok(())
}

// Source-like rendering; used as the best-effort text for forms the
// flowchart dialect has no counterpart for.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Index { base, index } => {
                write_operand(f, base, precedence::ATOM)?;
                write!(f, "[{}]", index)
            }
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => {
                let prec = operator.precedence();
                if *operator == BinaryOperator::Power {
                    write_operand(f, left, prec + 1)?;
                    write!(f, " ** ")?;
                    write_operand(f, right, precedence::UNARY)
                } else {
                    write_operand(f, left, prec)?;
                    write!(f, " {} ", operator.symbol())?;
                    write_operand(f, right, prec + 1)
                }
            }
            Expression::Compare { left, comparisons } => {
                write_operand(f, left, precedence::COMPARE + 1)?;
                for (operator, comparator) in comparisons {
                    write!(f, " {} ", operator.symbol())?;
                    write_operand(f, comparator, precedence::COMPARE + 1)?;
                }
                Ok(())
            }
            Expression::BoolOp { operator, values } => {
                let prec = self.precedence();
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", operator.keyword())?;
                    }
                    write_operand(f, value, prec + 1)?;
                }
                Ok(())
            }
            Expression::Call {
                callee,
                args,
                keywords,
            } => {
                write_operand(f, callee, precedence::ATOM)?;
                write!(f, "(")?;
                write_list(f, args)?;
                for (i, keyword) in keywords.iter().enumerate() {
                    if i > 0 || !args.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", keyword.name, keyword.value)?;
                }
                write!(f, ")")
            }
            Expression::ListLiteral(elements) => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            Expression::UnaryOp { operator, operand } => {
                write!(f, "{}", operator.symbol())?;
                write_operand(f, operand, self.precedence())
            }
            Expression::Attribute { object, attribute } => {
                write_operand(f, object, precedence::ATOM)?;
                write!(f, ".{}", attribute)
            }
            Expression::Conditional { test, body, orelse } => {
                write_operand(f, body, precedence::OR)?;
                write!(f, " if ")?;
                write_operand(f, test, precedence::OR)?;
                write!(f, " else ")?;
                write_operand(f, orelse, precedence::CONDITIONAL)
            }
            Expression::Tuple(items) => {
                if items.len() == 1 {
                    write!(f, "{},", items[0])
                } else {
                    write_list(f, items)
                }
            }
            Expression::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    write!(f, "{}", lower)?;
                }
                write!(f, ":")?;
                if let Some(upper) = upper {
                    write!(f, "{}", upper)?;
                }
                if let Some(step) = step {
                    write!(f, ":{}", step)?;
                }
                Ok(())
            }
            Expression::FormattedString(text) => write!(f, "f\"{}\"", text),
            Expression::Unsupported(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign {
        targets: Vec<Expression>,
        value: Expression,
    },
    AugAssign {
        target: Expression,
        operator: BinaryOperator,
        value: Expression,
    },
    If {
        test: Expression,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    While {
        test: Expression,
        body: Vec<Statement>,
    },
    For {
        target: Expression,
        iter: Expression,
        body: Vec<Statement>,
    },
    Expression(Expression),
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
    },
    Return(Option<Expression>),
    Pass,
    Break,
    Continue,
    /// A statement outside the subset (`import`, `class`, `try`, ...);
    /// `text` is its first line.
    Unsupported {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}
