use crate::ast::{Expression, Statement};
use crate::diagnostics::Diagnostics;
use crate::fir::{DataKind, Direction, FlowNode};
use crate::symbol_table::SymbolTable;

use super::expressions::ExpressionTranslator;
use super::folding::{fold, Number};
use super::types::{infer_element_kind, infer_value_kind};

/// Condition of the `while` emitted for loops with no counted form.
pub const FALLBACK_CONDITION: &str = "true";

pub struct StatementTranslator<'t, 'a> {
    pub symbols: &'t mut SymbolTable<'a>,
    pub diagnostics: &'t mut Diagnostics,
}

impl<'t, 'a> StatementTranslator<'t, 'a> {
    pub fn new(symbols: &'t mut SymbolTable<'a>, diagnostics: &'t mut Diagnostics) -> Self {
        Self {
            symbols,
            diagnostics,
        }
    }

    fn expressions(&mut self) -> ExpressionTranslator<'_> {
        ExpressionTranslator::new(self.diagnostics)
    }

    /// Append the flowchart nodes for `statements` to `body`.
    pub fn translate<'s>(
        &mut self,
        statements: impl IntoIterator<Item = &'s Statement>,
        body: &mut Vec<FlowNode>,
    ) {
        for statement in statements {
            self.translate_statement(statement, body);
        }
    }

    fn translate_statement(&mut self, statement: &Statement, body: &mut Vec<FlowNode>) {
        match statement {
            Statement::FunctionDef { name, .. } => {
                self.diagnostics
                    .warn(format!("nested function '{}' is not supported and was skipped", name));
            }
            // Return values are wired up through the function's return variable
            Statement::Return(_) => {}
            Statement::Assign { targets, value } => {
                if let [target] = targets.as_slice() {
                    self.translate_assignment(target, value, body);
                } else {
                    self.diagnostics.warn(format!(
                        "assignment to {} targets is not supported and was skipped",
                        targets.len()
                    ));
                }
            }
            Statement::AugAssign {
                target, operator, ..
            } => {
                self.diagnostics.warn(format!(
                    "augmented assignment '{} {}=' is not supported and was skipped",
                    target,
                    operator.symbol()
                ));
            }
            Statement::Expression(expr) => self.translate_expression_statement(expr, body),
            Statement::If { test, body: then_statements, orelse } => {
                let condition = self.expressions().translate_condition(test);

                let mut then_body = Vec::new();
                self.translate(then_statements, &mut then_body);
                let mut else_body = Vec::new();
                self.translate(orelse, &mut else_body);

                body.push(FlowNode::If {
                    condition,
                    then_body,
                    else_body,
                });
            }
            Statement::While { test, body: loop_statements } => {
                let condition = self.expressions().translate_condition(test);

                let mut loop_body = Vec::new();
                self.translate(loop_statements, &mut loop_body);

                body.push(FlowNode::While {
                    condition,
                    body: loop_body,
                });
            }
            Statement::For { target, iter, body: loop_statements } => {
                self.translate_for(target, iter, loop_statements, body);
            }
            Statement::Break | Statement::Continue => {
                let keyword = if matches!(statement, Statement::Break) { "break" } else { "continue" };
                self.diagnostics
                    .warn(format!("'{}' is not supported and was skipped", keyword));
            }
            Statement::Unsupported { text } => {
                self.diagnostics
                    .warn(format!("statement '{}' is not supported and was skipped", text));
            }
            Statement::Pass => {}
        }
    }

    fn translate_assignment(&mut self, target: &Expression, value: &Expression, body: &mut Vec<FlowNode>) {
        match target {
            // Arrays are declared by their list assignment
            Expression::Index { .. } => {
                let variable = self.expressions().translate(target);
                let expression = self.expressions().translate(value);
                body.push(FlowNode::Assign { variable, expression });
            }
            Expression::Identifier(name) => self.translate_name_assignment(name, value, body),
            _ => {
                self.diagnostics.warn(format!(
                    "assignment to '{}' is not supported and was skipped",
                    target
                ));
            }
        }
    }

    fn translate_name_assignment(&mut self, name: &str, value: &Expression, body: &mut Vec<FlowNode>) {
        if let Some((args, candidate)) = interactive_read(value) {
            let prompt = self.expressions().first_argument(args);
            body.push(FlowNode::Output {
                expression: prompt,
                newline: true,
            });
            let declaration = self.symbols.declare_once(name, Some(candidate), false, None);
            body.extend(declaration.declare_node());
            body.push(FlowNode::Input {
                variable: name.to_string(),
            });
            return;
        }

        if let Expression::ListLiteral(elements) = value {
            let capacity = self
                .symbols
                .annotations()
                .capacity(name)
                .unwrap_or(elements.len());
            let declaration = self.symbols.declare_once(
                name,
                Some(infer_element_kind(elements)),
                true,
                Some(capacity),
            );
            body.extend(declaration.declare_node());

            let texts = self.expressions().translate_elements(elements);
            for (i, expression) in texts.into_iter().take(capacity).enumerate() {
                body.push(FlowNode::Assign {
                    variable: format!("{}[{}]", name, i),
                    expression,
                });
            }
            return;
        }

        let declaration = self
            .symbols
            .declare_once(name, Some(infer_value_kind(value)), false, None);
        body.extend(declaration.declare_node());

        let expression = self.expressions().translate(value);
        body.push(FlowNode::Assign {
            variable: name.to_string(),
            expression,
        });
    }

    fn translate_expression_statement(&mut self, expr: &Expression, body: &mut Vec<FlowNode>) {
        let Expression::Call { callee, args, .. } = expr else {
            // Docstrings and other bare values have no effect
            return;
        };

        match callee.as_ref() {
            Expression::Identifier(name) if name == "print" => {
                let expression = self.expressions().first_argument(args);
                body.push(FlowNode::Output {
                    expression,
                    newline: true,
                });
            }
            Expression::Identifier(name) => {
                let args = self.expressions().translate_elements(args);
                body.push(FlowNode::Call {
                    expression: format!("{}({})", name, args.join(", ")),
                });
            }
            _ => {
                let expression = self.expressions().translate(expr);
                body.push(FlowNode::Call { expression });
            }
        }
    }

    fn translate_for(
        &mut self,
        target: &Expression,
        iter: &Expression,
        loop_statements: &[Statement],
        body: &mut Vec<FlowNode>,
    ) {
        let counted = match (target, iter) {
            (Expression::Identifier(variable), Expression::Call { args, .. })
                if iter.callee_name() == Some("range") && (1..=3).contains(&args.len()) =>
            {
                Some((variable, args))
            }
            _ => None,
        };

        let Some((variable, args)) = counted else {
            self.diagnostics.warn(format!(
                "loop 'for {} in {}' has no counted form, emitted as 'while {}'",
                target, iter, FALLBACK_CONDITION
            ));
            let mut loop_body = Vec::new();
            self.translate(loop_statements, &mut loop_body);
            body.push(FlowNode::While {
                condition: FALLBACK_CONDITION.to_string(),
                body: loop_body,
            });
            return;
        };

        let (start, end, step) = match args.as_slice() {
            [end] => (None, end, None),
            [start, end] => (Some(start), end, None),
            [start, end, step, ..] => (Some(start), end, Some(step)),
            [] => return,
        };

        let start_value = start.map_or(Some(Number::Int(0)), fold);
        let end_value = fold(end);
        let step_value = step.map_or(Some(Number::Int(1)), fold);

        let mut direction = Direction::Inc;
        let step_text = match step_value {
            Some(value) if value.is_negative() => {
                direction = Direction::Dec;
                value.abs().map(|magnitude| magnitude.to_string())
            }
            Some(value) => Some(value.to_string()),
            None => None,
        };
        if direction == Direction::Inc {
            if let (Some(start), Some(end)) = (start_value, end_value) {
                if start > end {
                    direction = Direction::Dec;
                }
            }
        }

        let step_text = match (step_text, step) {
            (Some(text), _) => text,
            (None, Some(step)) => self.expressions().translate(step),
            (None, None) => "1".to_string(),
        };
        let start_text = match start {
            Some(start) => self.expressions().translate(start),
            None => "0".to_string(),
        };
        let end_text = self.expressions().translate(end);
        log::debug!(
            "counted loop over '{}': {} to {} step {} ({})",
            variable,
            start_text,
            end_text,
            step_text,
            direction.as_str()
        );

        let declaration = self
            .symbols
            .declare_once(variable, Some(DataKind::Integer), false, None);
        body.extend(declaration.declare_node());

        let mut loop_body = Vec::new();
        self.translate(loop_statements, &mut loop_body);

        body.push(FlowNode::For {
            variable: variable.clone(),
            start: start_text,
            end: end_text,
            direction,
            step: step_text,
            body: loop_body,
        });
    }
}

/// Arguments of an `input(...)` call and the kind its target defaults to.
/// `int(input(...))` and the other casts read into the cast's kind.
fn interactive_read(value: &Expression) -> Option<(&[Expression], DataKind)> {
    let Expression::Call { args, .. } = value else {
        return None;
    };

    match (value.callee_name()?, args.as_slice()) {
        ("input", _) => Some((args.as_slice(), DataKind::String)),
        (cast @ ("int" | "float" | "str"), [inner]) if inner.callee_name() == Some("input") => {
            let kind = match cast {
                "int" => DataKind::Integer,
                "float" => DataKind::Real,
                _ => DataKind::String,
            };
            interactive_read(inner).map(|(args, _)| (args, kind))
        }
        _ => None,
    }
}
