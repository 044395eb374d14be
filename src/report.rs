use std::path::Path;
use grammar::RuleSet;
use sppf::ParseError;
use crate::SpecError;

/// 1-based line and column (in characters) of a byte offset.
pub fn locate(input: &str, offset: usize) -> (usize, usize) {
  let mut offset = offset.min(input.len());
  while !input.is_char_boundary(offset) {
    offset -= 1;
  }
  let prefix = &input[..offset];
  let line = prefix.matches('\n').count() + 1;
  let col = prefix.rsplit('\n').next().map_or(0, |last| last.chars().count()) + 1;
  (line, col)
}

pub fn report_spec_error(
  path: impl AsRef<Path>,
  input: impl AsRef<str>,
  err: &SpecError
) -> String {
  match err {
    SpecError::Malformed { index } => {
      at(path, input.as_ref(), *index, "syntax error", &err.to_string())
    }
    _ => format!(
      "invalid grammar in {}\nmessage: {}\n",
      path.as_ref().display(),
      err
    ),
  }
}

pub fn report_parse_error(
  path: impl AsRef<Path>,
  input: impl AsRef<str>,
  err: &ParseError,
  rules: &RuleSet
) -> String {
  match err {
    ParseError::Stuck { index, expected: None } => {
      at(path, input.as_ref(), *index, "lexical error", &err.to_string())
    }
    ParseError::Stuck { index, expected: Some(item) } => {
      let message = format!("{}\nexpected: {}", err, rules.display_item(*item));
      at(path, input.as_ref(), *index, "syntax error", &message)
    }
    _ => format!("error in {}\nmessage: {}\n", path.as_ref().display(), err),
  }
}

fn at(
  path: impl AsRef<Path>,
  input: &str,
  offset: usize,
  error: &str,
  message: &str
) -> String {
  let (line, col) = locate(input, offset);
  format!(
    "{} at {}:{}:{}\nmessage: {}\n",
    error,
    path.as_ref().display(),
    line,
    col,
    message
  )
}
