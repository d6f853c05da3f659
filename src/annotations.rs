//! Sidecar hints read from trailing `#` comments.
//!
//! ```text
//! total = 0        # float      -> total is Real
//! scores = [1, 2]  # 10         -> scores is an array of 10
//! def area(w, h):  # real int int
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::codegen::types::{function_hint_kind, variable_hint_kind};
use crate::fir::DataKind;

static DEF_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+(\w+)\s*\([^)]*\)").expect("def pattern is valid"));

static ASSIGN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]\w*)\s*=(?:[^=]|$)").expect("assignment pattern is valid")
});

static LIST_ASSIGN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_]\w*)\s*=\s*\[").expect("list assignment pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    TypeHint(DataKind),
    Capacity(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHint {
    /// `None` for void.
    pub return_kind: Option<DataKind>,
    pub param_kinds: Vec<DataKind>,
}

#[derive(Debug, Default)]
pub struct AnnotationIndex {
    variables: HashMap<String, Annotation>,
    functions: HashMap<String, FunctionHint>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every line of `source`. A later hint for the same name replaces
    /// an earlier one.
    pub fn extract(source: &str) -> Self {
        let mut index = Self::new();
        let lines: Vec<&str> = source.lines().collect();

        for (line_no, line) in lines.iter().enumerate() {
            let Some((code, comment)) = split_comment(line) else {
                continue;
            };
            let comment = comment.trim().to_lowercase();

            if let Some(captures) = DEF_LINE.captures(code) {
                let mut words = comment.split_whitespace();
                if let Some(first) = words.next() {
                    let hint = FunctionHint {
                        return_kind: function_hint_kind(first),
                        param_kinds: words
                            .map(|word| function_hint_kind(word).unwrap_or(DataKind::Integer))
                            .collect(),
                    };
                    log::debug!("function hint for '{}': {:?}", &captures[1], hint);
                    index.functions.insert(captures[1].to_string(), hint);
                }
                continue;
            }

            let Some(target) = target_line(&lines, line_no, code) else {
                continue;
            };

            if !comment.is_empty() && comment.chars().all(|c| c.is_ascii_digit()) {
                if let (Some(captures), Ok(size)) =
                    (LIST_ASSIGN_LINE.captures(target), comment.parse::<usize>())
                {
                    index.record(&captures[1], Annotation::Capacity(size));
                }
            } else if let Some(kind) = variable_hint_kind(&comment) {
                if let Some(captures) = ASSIGN_LINE.captures(target) {
                    index.record(&captures[1], Annotation::TypeHint(kind));
                }
            }
        }

        index
    }

    fn record(&mut self, name: &str, annotation: Annotation) {
        log::debug!("annotation for '{}': {:?}", name, annotation);
        self.variables.insert(name.to_string(), annotation);
    }

    pub fn get(&self, name: &str) -> Option<Annotation> {
        self.variables.get(name).copied()
    }

    pub fn type_hint(&self, name: &str) -> Option<DataKind> {
        match self.get(name) {
            Some(Annotation::TypeHint(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn capacity(&self, name: &str) -> Option<usize> {
        match self.get(name) {
            Some(Annotation::Capacity(size)) => Some(size),
            _ => None,
        }
    }

    pub fn function_hint(&self, name: &str) -> Option<&FunctionHint> {
        self.functions.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.functions.is_empty()
    }
}

/// The line a comment annotates: its own line when that carries code,
/// otherwise the nearest non-blank line above.
fn target_line<'a>(lines: &[&'a str], line_no: usize, code: &'a str) -> Option<&'a str> {
    if !code.trim().is_empty() {
        return Some(code);
    }

    lines[..line_no]
        .iter()
        .rev()
        .copied()
        .find(|line| !line.trim().is_empty())
        .map(|line| split_comment(line).map(|(code, _)| code).unwrap_or(line))
}

/// Split a line at the first `#` that is not inside a string literal.
fn split_comment(line: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '#' => return Some((&line[..i], &line[i + 1..])),
                _ => {}
            },
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_type_hint() {
        let index = AnnotationIndex::extract("total = 0  # Float\nname = x # str\n");
        assert_eq!(index.type_hint("total"), Some(DataKind::Real));
        assert_eq!(index.type_hint("name"), Some(DataKind::String));
    }

    #[test]
    fn test_comment_on_following_line() {
        let index = AnnotationIndex::extract("flag = 1\n\n# bool\n");
        assert_eq!(index.type_hint("flag"), Some(DataKind::Boolean));
    }

    #[test]
    fn test_capacity_only_for_list_assignments() {
        let index = AnnotationIndex::extract("arr = [1, 2, 3]  # 5\ncount = 0  # 7\n");
        assert_eq!(index.capacity("arr"), Some(5));
        assert_eq!(index.capacity("count"), None);
        assert_eq!(index.get("count"), None);
    }

    #[test]
    fn test_unknown_keywords_are_ignored() {
        let index = AnnotationIndex::extract("x = 1  # counter\ny == 2  # int\n");
        assert!(index.is_empty());
    }

    #[test]
    fn test_last_hint_wins() {
        let index = AnnotationIndex::extract("x = 1  # int\nx = 2  # string\n");
        assert_eq!(index.type_hint("x"), Some(DataKind::String));
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        let index = AnnotationIndex::extract("tag = \"#int\"\nlabel = '#' # str\n");
        assert_eq!(index.type_hint("tag"), None);
        assert_eq!(index.type_hint("label"), Some(DataKind::String));
    }

    #[test]
    fn test_function_hints() {
        let source = "def area(w, h):  # Real int double\n    return w * h\ndef show():  # void\n    pass\ndef bare(a): #\n    pass\n";
        let index = AnnotationIndex::extract(source);

        let area = index.function_hint("area").unwrap();
        assert_eq!(area.return_kind, Some(DataKind::Real));
        assert_eq!(area.param_kinds, vec![DataKind::Integer, DataKind::Real]);

        assert_eq!(index.function_hint("show").unwrap().return_kind, None);
        assert!(index.function_hint("bare").is_none());
    }
}
