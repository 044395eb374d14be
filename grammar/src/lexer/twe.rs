use std::fmt;
use std::ops::Range;
use fnv::FnvHashMap;
use crate::Name;

/// Half-open byte range over the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
  pub start: usize,
  pub end: usize,
}

impl Span {
  pub fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  pub fn len(self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(self) -> bool {
    self.start == self.end
  }

  pub fn range(self) -> Range<usize> {
    self.start..self.end
  }
}

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}..{}", self.start, self.end)
  }
}

/// A token occurrence. `span` includes the filler absorbed after the match,
/// `unabsorbed` and `lexeme` cover the match itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Twe {
  pub span: Span,
  pub token: Name,
  pub lexeme: Name,
  pub unabsorbed: Span,
}

impl fmt::Display for Twe {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{:?}", self.token, &*self.lexeme)
  }
}

/// Every token occurrence found over one input, indexed by where occurrences
/// start and end.
#[derive(Clone, Debug, Default)]
pub struct Lattice {
  input_len: usize,
  triples: Vec<Twe>,
  by_start: FnvHashMap<usize, Vec<usize>>,
  by_end: FnvHashMap<usize, Vec<usize>>,
}

impl Lattice {
  pub fn new(input_len: usize, triples: impl IntoIterator<Item = Twe>) -> Self {
    let mut triples = triples.into_iter().collect::<Vec<_>>();
    triples.sort();
    triples.dedup();

    let mut by_start = FnvHashMap::<usize, Vec<usize>>::default();
    let mut by_end = FnvHashMap::<usize, Vec<usize>>::default();
    for (i, twe) in triples.iter().enumerate() {
      by_start.entry(twe.span.start).or_default().push(i);
      by_end.entry(twe.span.end).or_default().push(i);
    }

    Self {
      input_len,
      triples,
      by_start,
      by_end,
    }
  }

  pub fn input_len(&self) -> usize {
    self.input_len
  }

  /// Number of triples.
  pub fn len(&self) -> usize {
    self.triples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.triples.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Twe> {
    self.triples.iter()
  }

  pub fn starting_at(&self, offset: usize) -> impl Iterator<Item = &Twe> {
    self.by_start.get(&offset).into_iter().flatten()
      .map(move |&i| &self.triples[i])
  }

  pub fn ending_at(&self, offset: usize) -> impl Iterator<Item = &Twe> {
    self.by_end.get(&offset).into_iter().flatten()
      .map(move |&i| &self.triples[i])
  }

  /// Keeps the triples `f` accepts.
  pub fn filter(self, f: impl FnMut(&Twe) -> bool) -> Self {
    let input_len = self.input_len;
    Self::new(input_len, self.triples.into_iter().filter(f))
  }

  /// `(start, end)` of every triple, in order.
  pub fn spans(&self) -> Vec<(usize, usize)> {
    self.triples.iter().map(|twe| (twe.span.start, twe.span.end)).collect()
  }
}

impl IntoIterator for Lattice {
  type Item = Twe;
  type IntoIter = std::vec::IntoIter<Twe>;

  fn into_iter(self) -> Self::IntoIter {
    self.triples.into_iter()
  }
}

impl<'a> IntoIterator for &'a Lattice {
  type Item = &'a Twe;
  type IntoIter = std::slice::Iter<'a, Twe>;

  fn into_iter(self) -> Self::IntoIter {
    self.triples.iter()
  }
}
