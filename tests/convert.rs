use chrono::NaiveDate;
use indoc::indoc;
use pretty_assertions::assert_eq;

use pyflow::fir::{DataKind, Direction, FlowNode, Function};
use pyflow::{convert_source, ConvertError, ConvertOptions, Converter};

fn main_body(source: &str) -> Vec<FlowNode> {
    let conversion = convert_source(source).unwrap();
    conversion.program.main().unwrap().body.clone()
}

fn count_declares(nodes: &[FlowNode], name: &str) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            FlowNode::Declare { name: declared, .. } if declared == name => 1,
            FlowNode::If { then_body, else_body, .. } => {
                count_declares(then_body, name) + count_declares(else_body, name)
            }
            FlowNode::While { body, .. } | FlowNode::For { body, .. } => count_declares(body, name),
            _ => 0,
        })
        .sum()
}

#[test]
fn declare_once_holds_across_nested_blocks() {
    let body = main_body(indoc! {"
        total = 0
        for i in range(5):
            if i > 2:
                total = total + i
            else:
                total = 'never'
        while total > 0:
            total = total - 1
    "});
    assert_eq!(count_declares(&body, "total"), 1);
    assert_eq!(count_declares(&body, "i"), 1);
    assert!(matches!(&body[0], FlowNode::Declare { kind: DataKind::Integer, .. }));
}

#[test]
fn type_hint_wins_over_literal_and_default() {
    let body = main_body(indoc! {"
        price = 10  # double
        label = 'x'
        count = other
    "});
    let kinds: Vec<DataKind> = body
        .iter()
        .filter_map(|node| match node {
            FlowNode::Declare { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![DataKind::Real, DataKind::String, DataKind::Integer]);
}

#[test]
fn every_if_has_an_else() {
    let body = main_body("if a:\n    if b:\n        print(1)\n");
    match &body[0] {
        FlowNode::If { then_body, else_body, .. } => {
            assert!(else_body.is_empty());
            assert!(matches!(&then_body[0], FlowNode::If { else_body, .. } if else_body.is_empty()));
        }
        other => panic!("Expected If node, got {:?}", other),
    }
}

#[test]
fn capacity_hint_sizes_the_array() {
    let body = main_body("arr = [1, 2, 3]  # 5\n");
    assert!(matches!(&body[0], FlowNode::Declare { is_array: true, size: Some(5), .. }));
    let assigned: Vec<&str> = body[1..]
        .iter()
        .filter_map(|node| match node {
            FlowNode::Assign { variable, .. } => Some(variable.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(assigned, vec!["arr[0]", "arr[1]", "arr[2]"]);
}

#[test]
fn input_produces_output_declare_input() {
    let body = main_body("name = input(\"Enter: \")\n");
    assert_eq!(body.len(), 3);
    assert!(matches!(&body[0], FlowNode::Output { expression, .. } if expression == "\"Enter: \""));
    assert!(matches!(&body[1], FlowNode::Declare { name, kind: DataKind::String, .. } if name == "name"));
    assert!(matches!(&body[2], FlowNode::Input { variable } if variable == "name"));
}

#[test]
fn range_loops_infer_direction() {
    let body = main_body("for i in range(10, 0, -2):\n    pass\nfor j in range(0, 10):\n    pass\n");
    let loops: Vec<(&str, &str, Direction, &str)> = body
        .iter()
        .filter_map(|node| match node {
            FlowNode::For { start, end, direction, step, .. } => {
                Some((start.as_str(), end.as_str(), *direction, step.as_str()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        loops,
        vec![("10", "0", Direction::Dec, "2"), ("0", "10", Direction::Inc, "1")]
    );
}

#[test]
fn unsupported_iteration_degrades_to_while() {
    let conversion = convert_source("for ch in word.upper():\n    print(ch)\n").unwrap();
    let main = conversion.program.main().unwrap();
    assert!(matches!(&main.body[0], FlowNode::While { condition, .. } if condition == "true"));
    assert_eq!(conversion.diagnostics.len(), 1);
}

#[test]
fn chained_comparison_expands_to_conjunction() {
    let body = main_body("if a < b < c:\n    pass\nwhile a > b and c < d:\n    pass\n");
    assert!(matches!(&body[0], FlowNode::If { condition, .. } if condition == "a < b and b < c"));
    assert!(matches!(&body[1], FlowNode::While { condition, .. } if condition == "a > b and c < d"));
}

#[test]
fn functions_precede_main() {
    let conversion = convert_source(indoc! {"
        def area(w, h):  # int int int
            a = w * h
            return a

        print(area(2, 3))
    "})
    .unwrap();
    let names: Vec<&str> = conversion
        .program
        .functions
        .iter()
        .map(|function: &Function| function.name.as_str())
        .collect();
    assert_eq!(names, vec!["area", "Main"]);

    let area = conversion.program.function("area").unwrap();
    assert_eq!(area.return_variable.as_deref(), Some("a"));
    assert_eq!(area.parameters.len(), 2);
}

#[test]
fn python_outside_the_subset_degrades() {
    let conversion = convert_source(indoc! {"
        import math
        d = {}
        x: int = 5
        print(x)
    "})
    .unwrap();
    let main = conversion.program.main().unwrap();
    let assigned: Vec<(&str, &str)> = main
        .body
        .iter()
        .filter_map(|node| match node {
            FlowNode::Assign { variable, expression } => Some((variable.as_str(), expression.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(assigned, vec![("d", "{}"), ("x", "5")]);
    assert_eq!(conversion.diagnostics.len(), 2);
}

#[test]
fn return_variable_comes_from_top_level_return() {
    let conversion = convert_source(indoc! {"
        def f(x):  # int int
            if x > 0:
                return x
            y = 1
            return y
    "})
    .unwrap();
    let f = conversion.program.function("f").unwrap();
    assert_eq!(f.return_variable.as_deref(), Some("y"));
}

#[test]
fn extreme_reals_use_exponent_form() {
    let body = main_body("x = 1e20\ny = 0.00000015\n");
    let expressions: Vec<&str> = body
        .iter()
        .filter_map(|node| match node {
            FlowNode::Assign { expression, .. } => Some(expression.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(expressions, vec!["1e+20", "1.5e-07"]);
}

#[test]
fn lex_errors_are_fatal() {
    assert!(matches!(
        convert_source("x = 'unterminated\n"),
        Err(ConvertError::LexError(_))
    ));
}

#[test]
fn writes_fprg_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.py");
    std::fs::write(&input, "name = input(\"Name? \")\nprint(\"Hi \" + name)\n").unwrap();

    let converter = Converter::new(ConvertOptions {
        output_dir: dir.path().join("out"),
        saved_at: NaiveDate::from_ymd_opt(2024, 3, 9).and_then(|date| date.and_hms_opt(14, 5, 7)),
        ..ConvertOptions::default()
    });
    let report = converter.convert_file(&input, None).unwrap();
    assert_eq!(report.output, dir.path().join("out").join("hello.fprg"));
    assert!(report.diagnostics.is_empty());

    let written = std::fs::read_to_string(&report.output).unwrap();
    let expected = indoc! {r#"
        <?xml version="1.0" ?>
        <flowgorithm fileversion="4.2">
            <attributes>
                <attribute name="name" value="hello_converted"/>
                <attribute name="authors" value="Python Converter"/>
                <attribute name="about" value="Converted from hello.py"/>
                <attribute name="saved" value="2024-03-09 02:05:07 PM"/>
                <attribute name="created" value="Q29udmVydGVkOzIwMjQtMDMtMDkgMDI6MDU6MDcgUE0="/>
                <attribute name="edited" value="Q29udmVydGVkOzIwMjQtMDMtMDkgMDI6MDU6MDcgUE0="/>
            </attributes>
            <function name="Main" type="None" variable="">
                <parameters/>
                <body>
                    <output expression="&quot;Name? &quot;" newline="True"/>
                    <declare name="name" type="String" array="False" size=""/>
                    <input variable="name"/>
                    <output expression="&quot;Hi &quot; + name" newline="True"/>
                </body>
            </function>
        </flowgorithm>
    "#};
    assert_eq!(written, expected);
}

#[test]
fn missing_input_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let converter = Converter::new(ConvertOptions {
        output_dir: dir.path().to_path_buf(),
        ..ConvertOptions::default()
    });
    let err = converter
        .convert_file(&dir.path().join("missing.py"), None)
        .unwrap_err();
    assert!(matches!(err, ConvertError::InputError { .. }));
    assert!(err.to_string().contains("missing.py"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
