use std::error;
use std::fmt;
use grammar::{GrammarError, PatternError};

mod build;
mod meta;
mod spec;

pub mod io;
pub mod report;

pub use spec::Specification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
  /// The text is not a grammar description; `index` is how far it made sense.
  Malformed {
    index: usize,
  },
  /// The text reads as a grammar description in more than one way.
  Ambiguous {
    trees: usize,
  },
  StrictWithoutStart,
  UnknownStart(String),
  UnknownAbsorb(String),
  DuplicateLexRule(String),
  InvalidPattern(PatternError),
  Grammar(GrammarError),
  Json(String),
}

impl fmt::Display for SpecError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      SpecError::Malformed { index } => {
        write!(f, "malformed grammar description at offset {}", index)
      }
      SpecError::Ambiguous { trees } => {
        write!(f, "grammar description reads {} ways", trees)
      }
      SpecError::StrictWithoutStart => {
        write!(f, "strict grammar with several non-terminals needs a `start` directive")
      }
      SpecError::UnknownStart(name) => {
        write!(f, "start symbol `{}` is not defined", name)
      }
      SpecError::UnknownAbsorb(name) => {
        write!(f, "absorbed token `{}` is not defined", name)
      }
      SpecError::DuplicateLexRule(name) => {
        write!(f, "lexical rule `{}` is defined more than once", name)
      }
      SpecError::InvalidPattern(err) => write!(f, "{}", err),
      SpecError::Grammar(err) => write!(f, "{}", err),
      SpecError::Json(message) => write!(f, "invalid snapshot: {}", message),
    }
  }
}

impl error::Error for SpecError {}

impl From<PatternError> for SpecError {
  fn from(err: PatternError) -> Self {
    SpecError::InvalidPattern(err)
  }
}

impl From<GrammarError> for SpecError {
  fn from(err: GrammarError) -> Self {
    SpecError::Grammar(err)
  }
}

impl From<serde_json::Error> for SpecError {
  fn from(err: serde_json::Error) -> Self {
    SpecError::Json(err.to_string())
  }
}
