//! Flowchart intermediate representation: the tree of flowchart primitives
//! produced by the translator and consumed by the serializers.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataKind {
    Integer,
    String,
    Real,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inc,
    Dec,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inc => "inc",
            Direction::Dec => "dec",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum FlowNode {
    Declare {
        name: String,
        kind: DataKind,
        is_array: bool,
        size: Option<usize>,
    },
    Assign {
        variable: String,
        expression: String,
    },
    Output {
        expression: String,
        newline: bool,
    },
    Input {
        variable: String,
    },
    Call {
        expression: String,
    },
    If {
        condition: String,
        then_body: Vec<FlowNode>,
        else_body: Vec<FlowNode>,
    },
    While {
        condition: String,
        body: Vec<FlowNode>,
    },
    For {
        variable: String,
        start: String,
        end: String,
        direction: Direction,
        step: String,
        body: Vec<FlowNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: DataKind,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub return_kind: Option<DataKind>,
    pub return_variable: Option<String>,
    pub parameters: Vec<Parameter>,
    pub body: Vec<FlowNode>,
}

impl Function {
    pub fn is_main(&self) -> bool {
        self.name == MAIN_FUNCTION
    }
}

pub const MAIN_FUNCTION: &str = "Main";

/// Translated program; user functions in source order, `Main` last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowProgram {
    pub functions: Vec<Function>,
}

impl FlowProgram {
    pub fn main(&self) -> Option<&Function> {
        self.functions.iter().find(|function| function.is_main())
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }
}
