pub mod expressions;
pub mod folding;
pub mod program;
pub mod statements;
pub mod types;

pub use expressions::ExpressionTranslator;
pub use program::{FunctionSignature, ProgramBuilder};
pub use statements::StatementTranslator;
