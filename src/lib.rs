pub mod annotations;
pub mod ast;
pub mod codegen;
pub mod converter;
pub mod diagnostics;
pub mod error;
pub mod fir;
pub mod fprg;
pub mod lexer;
pub mod parser;
pub mod symbol_table;

pub use converter::{convert_source, ConvertOptions, Conversion, ConversionReport, Converter, EmitFormat};
pub use error::{ConvertError, ConvertResult};
