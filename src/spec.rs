use grammar::{LexMode, Lexer, Name, Pattern, RuleSet};
use sppf::{
  longest_match_dead_branch_prune, Chooser, Forest, ParseError, ParseOptions,
  Parser, Tree,
};
use crate::meta::{self, META};
use crate::{build, SpecError};

/// A grammar ready to parse with: rules, token table, filler to absorb and
/// the symbol parses start from. Immutable once built, so one specification
/// can serve any number of parses, from any number of threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
  rules: RuleSet,
  lexer: Lexer,
  absorb: Vec<Pattern>,
  start: Name,
}

impl Default for Specification {
  fn default() -> Self {
    Self::new(RuleSet::default(), Lexer::new(), vec![], "")
  }
}

impl Specification {
  pub fn new(
    rules: RuleSet,
    lexer: Lexer,
    absorb: Vec<Pattern>,
    start: impl Into<Name>,
  ) -> Self {
    Self {
      rules,
      lexer,
      absorb,
      start: start.into(),
    }
  }

  /// Reads a grammar description. Tokens are lexed ambiguously and
  /// narrowed to their longest matches.
  pub fn from_bnf(text: &str) -> Result<Self, SpecError> {
    Self::bootstrap(text, LexMode::Ambiguous)
  }

  /// Reads a grammar description with longest-match lexing.
  pub fn from_bnf_classic(text: &str) -> Result<Self, SpecError> {
    Self::bootstrap(text, LexMode::Classic)
  }

  fn bootstrap(text: &str, mode: LexMode) -> Result<Self, SpecError> {
    if text.trim().is_empty() {
      return Ok(Self::default());
    }

    let text = format!("{}\n", text);
    let meta = &*META;
    let chooser: Option<&Chooser> = match mode {
      LexMode::Ambiguous => Some(&longest_match_dead_branch_prune),
      LexMode::Classic => None,
    };

    log::debug!("reading a grammar description of {} bytes", text.len());
    let forest = Parser::new(&meta.rules, &meta.lexer)
      .try_parse(meta::START, &text, ParseOptions {
        absorb: &meta.absorb,
        chooser,
        mode,
      })
      .map_err(|err| match err {
        ParseError::Stuck { index, .. } => SpecError::Malformed { index },
        _ => SpecError::Malformed { index: 0 },
      })?;

    let trees = forest.trees();
    match trees.as_slice() {
      [tree] => build::walk(tree),
      _ => Err(SpecError::Ambiguous { trees: trees.len() }),
    }
  }

  pub fn rules(&self) -> &RuleSet {
    &self.rules
  }

  pub fn lexer(&self) -> &Lexer {
    &self.lexer
  }

  pub fn absorb(&self) -> &[Pattern] {
    &self.absorb
  }

  pub fn start_symbol(&self) -> &str {
    &self.start
  }

  /// True when there are no rules to parse with.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// The same grammar parsing from another symbol.
  pub fn with_start(&self, start: impl Into<Name>) -> Self {
    Self {
      start: start.into(),
      ..self.clone()
    }
  }

  pub fn parser(&self) -> Parser<'_> {
    Parser::new(&self.rules, &self.lexer)
  }

  pub fn parse(&self, input: &str) -> Option<Forest> {
    self.try_parse(input).ok()
  }

  pub fn parse_with(&self, input: &str, chooser: &Chooser) -> Option<Forest> {
    self.try_parse_with(input, Some(chooser), LexMode::Ambiguous).ok()
  }

  pub fn try_parse(&self, input: &str) -> Result<Forest, ParseError> {
    self.try_parse_with(input, None, LexMode::Ambiguous)
  }

  pub fn try_parse_with(
    &self,
    input: &str,
    chooser: Option<&Chooser>,
    mode: LexMode,
  ) -> Result<Forest, ParseError> {
    self.parser().try_parse(&self.start, input, ParseOptions {
      absorb: &self.absorb,
      chooser,
      mode,
    })
  }

  /// Longest-match lexing, and the input must parse exactly one way.
  pub fn parse_classic(&self, input: &str) -> Result<Tree, ParseError> {
    self.parser().parse_classic(&self.start, input, &self.absorb)
  }
}
