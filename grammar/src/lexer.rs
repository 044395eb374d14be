use std::cmp::Reverse;
use std::collections::VecDeque;
use std::error;
use std::fmt;
use fnv::FnvHashSet;
use indexmap::IndexMap;
use rayon::prelude::*;
use crate::Name;

pub use pattern::{Pattern, PatternError, PatternOptions};
pub use twe::{Lattice, Span, Twe};

mod absorb;
mod pattern;
mod twe;

/// Token tables at least this large match their patterns on the thread pool.
pub const PARALLEL_THRESHOLD: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LexMode {
  /// Every prefix every token matches.
  #[default]
  Ambiguous,
  /// Only the match ending furthest right at each offset. Of tokens tying
  /// for it, the one declared first wins.
  Classic,
}

/// The input could not be covered by tokens; `offset` is the furthest point
/// lexing reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
  pub offset: usize,
}

impl fmt::Display for LexError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "no token matches at offset {}", self.offset)
  }
}

impl error::Error for LexError {}

/// Named token patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexer {
  tokens: IndexMap<Name, Pattern>,
}

impl Lexer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, token: impl Into<Name>, pattern: Pattern) -> Option<Pattern> {
    self.tokens.insert(token.into(), pattern)
  }

  pub fn contains(&self, token: &str) -> bool {
    self.tokens.contains_key(token)
  }

  pub fn len(&self) -> usize {
    self.tokens.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tokens.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Name, &Pattern)> {
    self.tokens.iter()
  }

  /// Explores, breadth first from offset 0, every offset some token reaches.
  /// Filler matched by `absorb` is skipped at the very start and folded into
  /// the token before it everywhere else. Input that is nothing but filler
  /// lexes like empty input.
  pub fn lex(
    &self,
    input: &str,
    absorb: &[Pattern],
    mode: LexMode,
  ) -> Result<Lattice, LexError> {
    let mut frontier = VecDeque::from([0]);
    let mut explored = FnvHashSet::default();
    explored.insert(0);
    let mut furthest = 0;
    let mut triples = vec![];

    while let Some(left) = frontier.pop_front() {
      furthest = furthest.max(left);

      let skip = if left == 0 {
        absorb::reach(input, 0, absorb)
      } else {
        0
      };

      let mut found = self.matches_at(input, left, skip, absorb);
      if mode == LexMode::Classic {
        found = self.longest(found).into_iter().collect();
      }

      for twe in &found {
        if explored.insert(twe.span.end) {
          frontier.push_back(twe.span.end);
        }
      }
      triples.extend(found);
    }

    if !explored.contains(&input.len()) {
      if absorb::reach(input, 0, absorb) == input.len() {
        log::trace!("input is nothing but filler");
        return Ok(Lattice::new(0, vec![]));
      }
      log::trace!("lexing stuck at offset {} of {}", furthest, input.len());
      return Err(LexError { offset: furthest });
    }

    let triples = absorb::drop_redundant(triples, absorb);
    log::trace!("lexed {} triples over {} offsets", triples.len(), explored.len());

    Ok(Lattice::new(input.len(), triples))
  }

  fn longest(&self, found: Vec<Twe>) -> Option<Twe> {
    found.into_iter().min_by_key(|twe| {
      (
        Reverse(twe.span.end),
        self.tokens.get_index_of(&twe.token),
        Reverse(twe.unabsorbed.end),
      )
    })
  }

  fn matches_at(
    &self,
    input: &str,
    left: usize,
    skip: usize,
    absorb: &[Pattern],
  ) -> Vec<Twe> {
    let from = left + skip;
    let rest = &input[from..];

    let scan = |(token, pattern): (&Name, &Pattern)| {
      pattern.match_ends(rest).into_iter().map(|len| {
        let unabsorbed = Span::new(from, from + len);
        Twe {
          span: Span::new(left, absorb::reach(input, unabsorbed.end, absorb)),
          token: token.clone(),
          lexeme: input[unabsorbed.range()].into(),
          unabsorbed,
        }
      }).collect::<Vec<_>>()
    };

    if self.tokens.len() >= PARALLEL_THRESHOLD {
      self.tokens.iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .flat_map_iter(scan)
        .collect()
    } else {
      self.tokens.iter().flat_map(scan).collect()
    }
  }
}

impl FromIterator<(Name, Pattern)> for Lexer {
  fn from_iter<I: IntoIterator<Item = (Name, Pattern)>>(iter: I) -> Self {
    Self {
      tokens: iter.into_iter().collect(),
    }
  }
}
