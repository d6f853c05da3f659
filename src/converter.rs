use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::annotations::AnnotationIndex;
use crate::codegen::ProgramBuilder;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ConvertError, ConvertResult};
use crate::fir::FlowProgram;
use crate::fprg::{FileMetadata, FprgWriter, DEFAULT_AUTHORS};
use crate::lexer::Lexer;
use crate::parser::Parser;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitFormat {
    Fprg,
    Json,
}

impl EmitFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            EmitFormat::Fprg => "fprg",
            EmitFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output_dir: PathBuf,
    pub emit: EmitFormat,
    pub authors: String,
    /// Timestamp written into the metadata; the current local time when unset.
    pub saved_at: Option<NaiveDateTime>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            emit: EmitFormat::Fprg,
            authors: DEFAULT_AUTHORS.to_string(),
            saved_at: None,
        }
    }
}

/// In-memory result of translating one source text.
#[derive(Debug)]
pub struct Conversion {
    pub program: FlowProgram,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub functions: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex, parse and translate `source`. Nothing is written; a lex or parse
/// failure aborts before any translation happens.
pub fn convert_source(source: &str) -> ConvertResult<Conversion> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse()?;
    log::debug!("parsed {} top-level statement(s)", program.statements.len());

    let annotations = AnnotationIndex::extract(source);
    let mut diagnostics = Diagnostics::new();
    let program = ProgramBuilder::new(&annotations, &mut diagnostics).build(&program);

    Ok(Conversion {
        program,
        diagnostics: diagnostics.into_vec(),
    })
}

pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Where the converted file for `input` goes. An explicit `output` name
    /// is still placed under the output directory.
    pub fn output_path(&self, input: &Path, output: Option<&Path>) -> PathBuf {
        match output {
            Some(output) => self.options.output_dir.join(output),
            None => {
                let stem = file_stem(input);
                self.options
                    .output_dir
                    .join(format!("{}.{}", stem, self.options.emit.extension()))
            }
        }
    }

    /// Serialize a finished conversion in the configured format.
    pub fn render(&self, conversion: &Conversion, stem: &str) -> ConvertResult<String> {
        match self.options.emit {
            EmitFormat::Fprg => {
                let saved_at = self
                    .options
                    .saved_at
                    .unwrap_or_else(|| Local::now().naive_local());
                let metadata =
                    FileMetadata::for_source(stem, saved_at).with_authors(&self.options.authors);
                Ok(FprgWriter::new().write(&conversion.program, &metadata))
            }
            EmitFormat::Json => Ok(serde_json::to_string_pretty(&conversion.program)?),
        }
    }

    pub fn convert_file(&self, input: &Path, output: Option<&Path>) -> ConvertResult<ConversionReport> {
        let source = fs::read_to_string(input).map_err(|source| ConvertError::InputError {
            path: input.display().to_string(),
            source,
        })?;
        log::info!("converting '{}'", input.display());

        let conversion = convert_source(&source)?;
        let rendered = self.render(&conversion, &file_stem(input))?;

        let output = self.output_path(input, output);
        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConvertError::OutputError {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(&output, rendered).map_err(|source| ConvertError::OutputError {
            path: output.display().to_string(),
            source,
        })?;
        log::info!("wrote '{}'", output.display());

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output,
            functions: conversion.program.functions.len(),
            diagnostics: conversion.diagnostics,
        })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string())
}
