use crate::ast::{precedence, BinaryOperator, CompareOperator, Expression, UnaryOperator};
use crate::diagnostics::Diagnostics;

/// Text of a translated expression plus how tightly it binds, so enclosing
/// operators know when to parenthesize it.
struct Rendered {
    text: String,
    precedence: u8,
}

impl Rendered {
    fn new(text: String, precedence: u8) -> Self {
        Self { text, precedence }
    }

    fn atom(text: String) -> Self {
        Self::new(text, precedence::ATOM)
    }

    fn wrapped_below(self, min_precedence: u8) -> String {
        if self.precedence < min_precedence {
            format!("({})", self.text)
        } else {
            self.text
        }
    }
}

pub struct ExpressionTranslator<'a> {
    pub diagnostics: &'a mut Diagnostics,
}

impl<'a> ExpressionTranslator<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Convert an expression to Flowgorithm expression text.
    pub fn translate(&mut self, expr: &Expression) -> String {
        self.render(expr).text
    }

    /// Element texts of a list literal, in order.
    pub fn translate_elements(&mut self, elements: &[Expression]) -> Vec<String> {
        elements.iter().map(|element| self.translate(element)).collect()
    }

    /// Text for an `if`/`while` test. A conditional expression used as a
    /// test keeps its condition and its first branch.
    pub fn translate_condition(&mut self, condition: &Expression) -> String {
        match condition {
            Expression::Conditional { test, body, .. } => {
                self.diagnostics.warn(format!(
                    "conditional expression used as a condition; the 'else' branch of '{}' is dropped",
                    condition
                ));
                let test = self.translate_condition(test);
                let body = self.translate_condition(body);
                format!("{} and {}", test, body)
            }
            _ => self.translate(condition),
        }
    }

    /// First argument text of a display or read call, `""` without one.
    pub fn first_argument(&mut self, args: &[Expression]) -> String {
        match args.first() {
            Some(arg) => self.translate(arg),
            None => "\"\"".to_string(),
        }
    }

    fn render(&mut self, expr: &Expression) -> Rendered {
        match expr {
            Expression::Literal(literal) => Rendered::new(literal.to_string(), expr.precedence()),
            Expression::Identifier(name) => Rendered::atom(name.clone()),
            Expression::Index { base, index } => {
                let base = self.render(base).wrapped_below(precedence::ATOM);
                let index = self.translate(index);
                Rendered::atom(format!("{}[{}]", base, index))
            }
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => self.render_binary(left, *operator, right),
            Expression::Compare { left, comparisons } => self.render_compare(left, comparisons),
            Expression::BoolOp { operator, values } => {
                let prec = expr.precedence();
                let parts: Vec<String> = values
                    .iter()
                    .map(|value| self.render(value).wrapped_below(prec + 1))
                    .collect();
                Rendered::new(parts.join(&format!(" {} ", operator.keyword())), prec)
            }
            Expression::UnaryOp { operator, operand } if *operator != UnaryOperator::Invert => {
                let prec = expr.precedence();
                let operand = self.render(operand).wrapped_below(prec);
                Rendered::new(format!("{}{}", operator.symbol(), operand), prec)
            }
            Expression::Call { callee, args, keywords } => {
                if !keywords.is_empty() {
                    self.diagnostics.warn(format!(
                        "keyword arguments of '{}' are not represented",
                        expr
                    ));
                }
                self.render_call(callee, args)
            }
            _ => self.fallback(expr),
        }
    }

    fn render_binary(&mut self, left: &Expression, operator: BinaryOperator, right: &Expression) -> Rendered {
        let prec = operator.precedence();
        let symbol = match operator {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::BitAnd => "&",
            unmapped => {
                self.diagnostics.warn(format!(
                    "operator '{}' has no flowchart equivalent, rendered as '?'",
                    unmapped.symbol()
                ));
                "?"
            }
        };

        let (left_min, right_min) = if operator == BinaryOperator::Power {
            (prec + 1, precedence::UNARY)
        } else {
            (prec, prec + 1)
        };
        let left = self.render(left).wrapped_below(left_min);
        let right = self.render(right).wrapped_below(right_min);

        Rendered::new(format!("{} {} {}", left, symbol, right), prec)
    }

    /// `a < b < c` becomes `a < b and b < c`.
    fn render_compare(&mut self, left: &Expression, comparisons: &[(CompareOperator, Expression)]) -> Rendered {
        let operand_min = precedence::COMPARE + 1;
        let mut previous = self.render(left).wrapped_below(operand_min);
        let mut parts = Vec::with_capacity(comparisons.len());

        for (operator, comparator) in comparisons {
            let symbol = match operator {
                CompareOperator::Equal => "==",
                CompareOperator::NotEqual => "!=",
                CompareOperator::Less => "<",
                CompareOperator::LessEqual => "<=",
                CompareOperator::Greater => ">",
                CompareOperator::GreaterEqual => ">=",
                unmapped => {
                    self.diagnostics.warn(format!(
                        "comparison '{}' has no flowchart equivalent, rendered as '=='",
                        unmapped.symbol()
                    ));
                    "=="
                }
            };
            let right = self.render(comparator).wrapped_below(operand_min);
            parts.push(format!("{} {} {}", previous, symbol, right));
            previous = right;
        }

        let prec = if parts.len() > 1 {
            precedence::AND
        } else {
            precedence::COMPARE
        };
        Rendered::new(parts.join(" and "), prec)
    }

    fn render_call(&mut self, callee: &Expression, args: &[Expression]) -> Rendered {
        let name = match callee {
            Expression::Identifier(name) => name.as_str(),
            _ => {
                let callee = self.fallback(callee).wrapped_below(precedence::ATOM);
                let args = self.translate_elements(args);
                return Rendered::atom(format!("{}({})", callee, args.join(", ")));
            }
        };

        match (name, args) {
            ("input" | "print", []) => Rendered::atom("\"\"".to_string()),
            ("input" | "print", [first, ..]) => self.render(first),
            ("Size" | "len", []) => Rendered::atom("Size()".to_string()),
            ("Size" | "len", [first, ..]) => {
                let array = self.translate(first);
                Rendered::atom(format!("Size({})", array))
            }
            ("int" | "float" | "str", [only]) => self.render(only),
            _ => {
                let args = self.translate_elements(args);
                Rendered::atom(format!("{}({})", name, args.join(", ")))
            }
        }
    }

    fn fallback(&mut self, expr: &Expression) -> Rendered {
        self.diagnostics.warn(format!(
            "expression '{}' has no flowchart equivalent, kept as written",
            expr
        ));
        Rendered::new(expr.to_string(), expr.precedence())
    }
}
