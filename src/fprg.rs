//! Flowgorithm `.fprg` XML output.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDateTime;

use crate::codegen::types::{flowgorithm_return_type, flowgorithm_type};
use crate::fir::{FlowNode, FlowProgram, Function};

pub const FILE_VERSION: &str = "4.2";
pub const DEFAULT_AUTHORS: &str = "Python Converter";

const INDENT: &str = "    ";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// Contents of the `<attributes>` block.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub name: String,
    pub authors: String,
    pub about: String,
    pub saved: String,
    pub created: String,
    pub edited: String,
}

impl FileMetadata {
    /// Metadata for a flowchart converted from `<stem>.py` at `saved_at`.
    pub fn for_source(stem: &str, saved_at: NaiveDateTime) -> Self {
        let saved = saved_at.format(TIMESTAMP_FORMAT).to_string();
        let stamp = STANDARD.encode(format!("Converted;{}", saved));

        Self {
            name: format!("{}_converted", stem),
            authors: DEFAULT_AUTHORS.to_string(),
            about: format!("Converted from {}.py", stem),
            saved,
            created: stamp.clone(),
            edited: stamp,
        }
    }

    pub fn with_authors(mut self, authors: &str) -> Self {
        self.authors = authors.to_string();
        self
    }
}

pub struct FprgWriter {
    output: String,
    depth: usize,
}

impl FprgWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            depth: 0,
        }
    }

    pub fn write(mut self, program: &FlowProgram, metadata: &FileMetadata) -> String {
        self.output.push_str("<?xml version=\"1.0\" ?>\n");
        self.open("flowgorithm", &[("fileversion", FILE_VERSION)]);

        self.open("attributes", &[]);
        for (name, value) in [
            ("name", &metadata.name),
            ("authors", &metadata.authors),
            ("about", &metadata.about),
            ("saved", &metadata.saved),
            ("created", &metadata.created),
            ("edited", &metadata.edited),
        ] {
            self.empty("attribute", &[("name", name), ("value", value.as_str())]);
        }
        self.close("attributes");

        for function in &program.functions {
            self.write_function(function);
        }

        self.close("flowgorithm");
        self.output
    }

    fn write_function(&mut self, function: &Function) {
        self.open(
            "function",
            &[
                ("name", function.name.as_str()),
                ("type", flowgorithm_return_type(function.return_kind)),
                ("variable", function.return_variable.as_deref().unwrap_or("")),
            ],
        );

        if function.parameters.is_empty() {
            self.empty("parameters", &[]);
        } else {
            self.open("parameters", &[]);
            for parameter in &function.parameters {
                self.empty(
                    "parameter",
                    &[
                        ("name", parameter.name.as_str()),
                        ("type", flowgorithm_type(parameter.kind)),
                        ("array", flag(parameter.is_array)),
                    ],
                );
            }
            self.close("parameters");
        }

        self.block("body", &[], &function.body);
        self.close("function");
    }

    fn write_node(&mut self, node: &FlowNode) {
        match node {
            FlowNode::Declare {
                name,
                kind,
                is_array,
                size,
            } => {
                let size = size.map(|size| size.to_string()).unwrap_or_default();
                self.empty(
                    "declare",
                    &[
                        ("name", name.as_str()),
                        ("type", flowgorithm_type(*kind)),
                        ("array", flag(*is_array)),
                        ("size", size.as_str()),
                    ],
                );
            }
            FlowNode::Assign {
                variable,
                expression,
            } => self.empty("assign", &[("variable", variable.as_str()), ("expression", expression.as_str())]),
            FlowNode::Output {
                expression,
                newline,
            } => self.empty("output", &[("expression", expression.as_str()), ("newline", flag(*newline))]),
            FlowNode::Input { variable } => self.empty("input", &[("variable", variable.as_str())]),
            FlowNode::Call { expression } => self.empty("call", &[("expression", expression.as_str())]),
            FlowNode::If {
                condition,
                then_body,
                else_body,
            } => {
                self.open("if", &[("expression", condition.as_str())]);
                self.block("then", &[], then_body);
                self.block("else", &[], else_body);
                self.close("if");
            }
            FlowNode::While { condition, body } => {
                self.block("while", &[("expression", condition.as_str())], body);
            }
            FlowNode::For {
                variable,
                start,
                end,
                direction,
                step,
                body,
            } => {
                self.block(
                    "for",
                    &[
                        ("variable", variable.as_str()),
                        ("start", start.as_str()),
                        ("end", end.as_str()),
                        ("direction", direction.as_str()),
                        ("step", step.as_str()),
                    ],
                    body,
                );
            }
        }
    }

    /// An element whose children are flowchart nodes; self-closed when empty.
    fn block(&mut self, tag: &str, attributes: &[(&str, &str)], nodes: &[FlowNode]) {
        if nodes.is_empty() {
            self.empty(tag, attributes);
            return;
        }

        self.open(tag, attributes);
        for node in nodes {
            self.write_node(node);
        }
        self.close(tag);
    }

    fn start_tag(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        for _ in 0..self.depth {
            self.output.push_str(INDENT);
        }
        self.output.push('<');
        self.output.push_str(tag);
        for (name, value) in attributes {
            self.output
                .push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
    }

    fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        self.start_tag(tag, attributes);
        self.output.push_str(">\n");
        self.depth += 1;
    }

    fn empty(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        self.start_tag(tag, attributes);
        self.output.push_str("/>\n");
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        for _ in 0..self.depth {
            self.output.push_str(INDENT);
        }
        self.output.push_str(&format!("</{}>\n", tag));
    }
}

impl Default for FprgWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fir::{DataKind, Direction, Parameter, MAIN_FUNCTION};
    use chrono::NaiveDate;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn saved_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 7))
            .unwrap()
    }

    #[test]
    fn test_metadata() {
        let metadata = FileMetadata::for_source("hello", saved_at());
        assert_eq!(metadata.name, "hello_converted");
        assert_eq!(metadata.about, "Converted from hello.py");
        assert_eq!(metadata.saved, "2024-03-09 02:05:07 PM");
        assert_eq!(metadata.created, "Q29udmVydGVkOzIwMjQtMDMtMDkgMDI6MDU6MDcgUE0=");
        assert_eq!(metadata.edited, metadata.created);
        assert_eq!(metadata.with_authors("Ada").authors, "Ada");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("\"a\" < b & c > d"), "&quot;a&quot; &lt; b &amp; c &gt; d");
        assert_eq!(escape_attribute("x\ty\n"), "x&#9;y&#10;");
    }

    #[test]
    fn test_full_document() {
        let program = FlowProgram {
            functions: vec![
                Function {
                    name: "square".to_string(),
                    return_kind: Some(DataKind::Integer),
                    return_variable: Some("result".to_string()),
                    parameters: vec![Parameter {
                        name: "n".to_string(),
                        kind: DataKind::Integer,
                        is_array: false,
                    }],
                    body: vec![FlowNode::Declare {
                        name: "result".to_string(),
                        kind: DataKind::Integer,
                        is_array: false,
                        size: None,
                    }],
                },
                Function {
                    name: MAIN_FUNCTION.to_string(),
                    return_kind: None,
                    return_variable: None,
                    parameters: Vec::new(),
                    body: vec![
                        FlowNode::Declare {
                            name: "arr".to_string(),
                            kind: DataKind::Real,
                            is_array: true,
                            size: Some(3),
                        },
                        FlowNode::If {
                            condition: "x > 0".to_string(),
                            then_body: vec![FlowNode::Output {
                                expression: "\"pos\"".to_string(),
                                newline: true,
                            }],
                            else_body: Vec::new(),
                        },
                        FlowNode::For {
                            variable: "i".to_string(),
                            start: "10".to_string(),
                            end: "0".to_string(),
                            direction: Direction::Dec,
                            step: "2".to_string(),
                            body: vec![FlowNode::Call {
                                expression: "square(i)".to_string(),
                            }],
                        },
                        FlowNode::While {
                            condition: "true".to_string(),
                            body: Vec::new(),
                        },
                    ],
                },
            ],
        };

        let xml = FprgWriter::new().write(&program, &FileMetadata::for_source("demo", saved_at()));
        let expected = indoc! {r#"
            <?xml version="1.0" ?>
            <flowgorithm fileversion="4.2">
                <attributes>
                    <attribute name="name" value="demo_converted"/>
                    <attribute name="authors" value="Python Converter"/>
                    <attribute name="about" value="Converted from demo.py"/>
                    <attribute name="saved" value="2024-03-09 02:05:07 PM"/>
                    <attribute name="created" value="Q29udmVydGVkOzIwMjQtMDMtMDkgMDI6MDU6MDcgUE0="/>
                    <attribute name="edited" value="Q29udmVydGVkOzIwMjQtMDMtMDkgMDI6MDU6MDcgUE0="/>
                </attributes>
                <function name="square" type="Integer" variable="result">
                    <parameters>
                        <parameter name="n" type="Integer" array="False"/>
                    </parameters>
                    <body>
                        <declare name="result" type="Integer" array="False" size=""/>
                    </body>
                </function>
                <function name="Main" type="None" variable="">
                    <parameters/>
                    <body>
                        <declare name="arr" type="Real" array="True" size="3"/>
                        <if expression="x &gt; 0">
                            <then>
                                <output expression="&quot;pos&quot;" newline="True"/>
                            </then>
                            <else/>
                        </if>
                        <for variable="i" start="10" end="0" direction="dec" step="2">
                            <call expression="square(i)"/>
                        </for>
                        <while expression="true"/>
                    </body>
                </function>
            </flowgorithm>
        "#};
        assert_eq!(xml, expected);
    }
}
