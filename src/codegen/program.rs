use crate::annotations::AnnotationIndex;
use crate::ast::{Expression, Program, Statement};
use crate::diagnostics::Diagnostics;
use crate::fir::{DataKind, FlowNode, FlowProgram, Function, Parameter, MAIN_FUNCTION};
use crate::symbol_table::SymbolTable;

use super::statements::StatementTranslator;

/// Placeholder return variable for functions that never return a bare name.
pub const DEFAULT_RETURN_VARIABLE: &str = "result";

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_kind: Option<DataKind>,
    pub param_kinds: Vec<DataKind>,
}

impl FunctionSignature {
    /// Signature from the function's annotation; missing return kind means
    /// void and missing parameter kinds are `Integer`.
    pub fn resolve(name: &str, param_count: usize, annotations: &AnnotationIndex) -> Self {
        let hint = annotations.function_hint(name);
        let hinted = hint.map(|hint| hint.param_kinds.as_slice()).unwrap_or(&[]);

        Self {
            name: name.to_string(),
            return_kind: hint.and_then(|hint| hint.return_kind),
            param_kinds: (0..param_count)
                .map(|i| hinted.get(i).copied().unwrap_or(DataKind::Integer))
                .collect(),
        }
    }
}

pub struct ProgramBuilder<'a, 'd> {
    annotations: &'a AnnotationIndex,
    symbols: SymbolTable<'a>,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> ProgramBuilder<'a, 'd> {
    pub fn new(annotations: &'a AnnotationIndex, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            annotations,
            symbols: SymbolTable::new(annotations),
            diagnostics,
        }
    }

    /// Translate every function definition in source order, then the
    /// remaining top-level statements as `Main`.
    pub fn build(mut self, program: &Program) -> FlowProgram {
        let (definitions, main_statements): (Vec<&Statement>, Vec<&Statement>) = program
            .statements
            .iter()
            .partition(|statement| matches!(statement, Statement::FunctionDef { .. }));

        let mut functions = Vec::with_capacity(definitions.len() + 1);
        for definition in definitions {
            if let Statement::FunctionDef { name, params, body } = definition {
                functions.push(self.build_function(name, params, body));
            }
        }

        functions.push(self.build_main(main_statements));

        log::info!(
            "translated {} function(s), {} variable(s) declared",
            functions.len(),
            self.symbols.symbol_count()
        );
        FlowProgram { functions }
    }

    fn build_function(&mut self, name: &str, params: &[String], statements: &[Statement]) -> Function {
        let signature = FunctionSignature::resolve(name, params.len(), self.annotations);
        log::debug!("building function '{}' with {:?}", name, signature);

        let return_variable = signature.return_kind.map(|_| {
            find_return_variable(statements).unwrap_or_else(|| {
                self.diagnostics.note(format!(
                    "function '{}' does not return a plain variable; using '{}' as its return variable",
                    name, DEFAULT_RETURN_VARIABLE
                ));
                DEFAULT_RETURN_VARIABLE.to_string()
            })
        });

        let parameters = params
            .iter()
            .zip(&signature.param_kinds)
            .map(|(param, kind)| Parameter {
                name: param.clone(),
                kind: *kind,
                is_array: false,
            })
            .collect();

        let body = self.translate_body(name, statements);
        Function {
            name: signature.name,
            return_kind: signature.return_kind,
            return_variable,
            parameters,
            body,
        }
    }

    fn build_main(&mut self, statements: Vec<&Statement>) -> Function {
        Function {
            name: MAIN_FUNCTION.to_string(),
            return_kind: None,
            return_variable: None,
            parameters: Vec::new(),
            body: self.translate_body(MAIN_FUNCTION, statements),
        }
    }

    fn translate_body<'s>(
        &mut self,
        name: &str,
        statements: impl IntoIterator<Item = &'s Statement>,
    ) -> Vec<FlowNode> {
        self.symbols.enter_function_scope(name);
        let mut body = Vec::new();
        StatementTranslator::new(&mut self.symbols, self.diagnostics).translate(statements, &mut body);
        self.symbols.exit_scope();
        body
    }
}

/// First top-level `return <name>` of a function body. Returns nested in
/// branches or loops are not considered.
pub fn find_return_variable(statements: &[Statement]) -> Option<String> {
    statements.iter().find_map(|statement| match statement {
        Statement::Return(Some(Expression::Identifier(name))) => Some(name.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use indoc::indoc;

    fn build(source: &str) -> (FlowProgram, Diagnostics) {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let annotations = AnnotationIndex::extract(source);
        let mut diagnostics = Diagnostics::new();
        let flow = ProgramBuilder::new(&annotations, &mut diagnostics).build(&program);
        (flow, diagnostics)
    }

    #[test]
    fn test_functions_first_then_main() {
        let (flow, _) = build(indoc! {"
            x = 1
            def greet():
                print('hi')
            greet()
            def twice(n):
                return n
        "});
        let names: Vec<&str> = flow.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["greet", "twice", "Main"]);
        assert_eq!(flow.main().unwrap().body.len(), 3);
    }

    #[test]
    fn test_signature_from_hint() {
        let (flow, _) = build(indoc! {"
            def area(w, h, d):  # real real
                result = w * h
                return result
        "});
        let area = flow.function("area").unwrap();
        assert_eq!(area.return_kind, Some(DataKind::Real));
        assert_eq!(area.return_variable.as_deref(), Some("result"));
        let kinds: Vec<DataKind> = area.parameters.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![DataKind::Real, DataKind::Integer, DataKind::Integer]);
    }

    #[test]
    fn test_unhinted_function_is_void() {
        let (flow, _) = build("def show(a):\n    print(a)\n    return a\n");
        let show = flow.function("show").unwrap();
        assert_eq!(show.return_kind, None);
        assert_eq!(show.return_variable, None);
        assert_eq!(show.parameters[0].kind, DataKind::Integer);
    }

    #[test]
    fn test_return_variable_scan() {
        let (flow, diagnostics) = build(indoc! {"
            def pick(a):  # int
                if a > 0:
                    return a + 1
                else:
                    return best
            def compute(a):  # int
                return a * 2
        "});
        assert_eq!(
            flow.function("pick").unwrap().return_variable.as_deref(),
            Some(DEFAULT_RETURN_VARIABLE)
        );
        assert_eq!(
            flow.function("compute").unwrap().return_variable.as_deref(),
            Some(DEFAULT_RETURN_VARIABLE)
        );
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_top_level_return_wins_over_branch_return() {
        let (flow, _) = build(indoc! {"
            def clamp(x):  # int int
                if x > 0:
                    return x
                y = 1
                return y
        "});
        assert_eq!(flow.function("clamp").unwrap().return_variable.as_deref(), Some("y"));
    }

    #[test]
    fn test_parameters_are_not_declared_and_scopes_are_separate() {
        let (flow, _) = build(indoc! {"
            def bump(n):  # int int
                total = n + 1
                return total
            total = 'text'
        "});
        let bump = flow.function("bump").unwrap();
        assert!(matches!(&bump.body[0], FlowNode::Declare { name, kind: DataKind::Integer, .. } if name == "total"));
        assert_eq!(bump.body.len(), 2);

        let main = flow.main().unwrap();
        assert!(matches!(&main.body[0], FlowNode::Declare { kind: DataKind::String, .. }));
    }
}
