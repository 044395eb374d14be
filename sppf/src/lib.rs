use std::error;
use std::fmt;
use grammar::{Item, Lattice, LexMode, Lexer, Name, Pattern, RuleSet};
use chart::Chart;

pub use chooser::{longest_match_dead_branch_prune, prune_dead_branches, Chooser};
pub use forest::{Child, Forest, Node, NodeId, Packed};
pub use tree::Tree;

mod chart;
mod chooser;
mod forest;
mod tree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  UnknownStart(Name),
  /// `index` is the furthest offset the parse (or, with `expected` unset,
  /// the lexer) reached; `expected` is an item that was blocked there.
  Stuck {
    index: usize,
    expected: Option<Item>,
  },
  /// A single tree was required.
  Ambiguous {
    trees: usize,
  },
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ParseError::UnknownStart(start) => {
        write!(f, "start symbol `{}` is not defined", start)
      }
      ParseError::Stuck { index, expected: None } => {
        write!(f, "no token matches at offset {}", index)
      }
      ParseError::Stuck { index, expected: Some(_) } => {
        write!(f, "no parse beyond offset {}", index)
      }
      ParseError::Ambiguous { trees } => {
        write!(f, "expected exactly one parse tree, found {}", trees)
      }
    }
  }
}

impl error::Error for ParseError {}

#[derive(Clone, Copy, Default)]
pub struct ParseOptions<'a> {
  /// Filler folded into the preceding token.
  pub absorb: &'a [Pattern],
  /// Applied to the token lattice before parsing.
  pub chooser: Option<&'a Chooser>,
  pub mode: LexMode,
}

/// A generalized parser over a grammar and a token table. Cheap to copy; all
/// parse state lives in the call.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'g> {
  rules: &'g RuleSet,
  lexer: &'g Lexer,
}

impl<'g> Parser<'g> {
  pub fn new(rules: &'g RuleSet, lexer: &'g Lexer) -> Self {
    Self { rules, lexer }
  }

  pub fn rules(&self) -> &'g RuleSet {
    self.rules
  }

  pub fn lexer(&self) -> &'g Lexer {
    self.lexer
  }

  pub fn parse(
    &self,
    start: &str,
    input: &str,
    options: ParseOptions,
  ) -> Option<Forest> {
    self.try_parse(start, input, options).ok()
  }

  pub fn try_parse(
    &self,
    start: &str,
    input: &str,
    options: ParseOptions,
  ) -> Result<Forest, ParseError> {
    if !self.rules.contains(start) {
      return Err(ParseError::UnknownStart(start.into()));
    }

    let lattice = self.lexer.lex(input, options.absorb, options.mode)
      .map_err(|err| ParseError::Stuck {
        index: err.offset,
        expected: None,
      })?;
    let lattice = match options.chooser {
      Some(choose) => choose(lattice),
      None => lattice,
    };

    self.parse_lattice(start, input, &lattice)
  }

  /// Parses an already built token lattice over `input`.
  pub fn parse_lattice(
    &self,
    start: &str,
    input: &str,
    lattice: &Lattice,
  ) -> Result<Forest, ParseError> {
    if !self.rules.contains(start) {
      return Err(ParseError::UnknownStart(start.into()));
    }

    let chart = Chart::recognize(self.rules, start.into(), lattice);
    if !chart.accepts() {
      return Err(chart.failure());
    }

    let forest = Forest::build(&chart, lattice, input);
    log::trace!("forest of {} nodes", forest.len());
    Ok(forest)
  }

  /// Longest-match lexing, and the grammar must then admit exactly one tree.
  pub fn parse_classic(
    &self,
    start: &str,
    input: &str,
    absorb: &[Pattern],
  ) -> Result<Tree, ParseError> {
    let forest = self.try_parse(start, input, ParseOptions {
      absorb,
      chooser: None,
      mode: LexMode::Classic,
    })?;

    let mut trees = forest.trees();
    if trees.len() != 1 {
      return Err(ParseError::Ambiguous { trees: trees.len() });
    }
    Ok(trees.swap_remove(0))
  }
}
