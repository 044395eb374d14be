//! Earley-style recognition over a token lattice.

use fnv::{FnvBuildHasher, FnvHashMap, FnvHashSet};
use indexmap::IndexSet;
use grammar::{Item, Lattice, Name, RuleItem, RuleSet, Terminal, TerminalSet};
use crate::ParseError;

type FnvIndexSet<T> = IndexSet<T, FnvBuildHasher>;

/// A dotted rule together with the offset its recognition started at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EarleyItem {
  pub item: Item,
  pub origin: usize,
}

pub(crate) struct Chart<'g> {
  rules: &'g RuleSet,
  start: Name,
  /// One set per input offset.
  sets: Vec<FnvIndexSet<EarleyItem>>,
  /// Items at an offset whose head is the keyed non-terminal.
  waiting: Vec<FnvHashMap<Name, Vec<EarleyItem>>>,
  predicted: Vec<FnvHashSet<Name>>,
  /// Non-terminals recognized over the empty span at an offset.
  empty: Vec<FnvHashSet<Name>>,
  /// (non-terminal, end) -> starts.
  completed: FnvHashMap<(Name, usize), Vec<usize>>,
  recognized: FnvHashSet<(Name, usize, usize)>,
  tests: FnvHashMap<Name, Option<TerminalSet>>,
}

impl<'g> Chart<'g> {
  pub fn recognize(rules: &'g RuleSet, start: Name, lattice: &Lattice) -> Self {
    let len = lattice.input_len();
    let mut chart = Chart {
      rules,
      start: start.clone(),
      sets: (0..=len).map(|_| FnvIndexSet::default()).collect(),
      waiting: (0..=len).map(|_| FnvHashMap::default()).collect(),
      predicted: (0..=len).map(|_| FnvHashSet::default()).collect(),
      empty: (0..=len).map(|_| FnvHashSet::default()).collect(),
      completed: FnvHashMap::default(),
      recognized: FnvHashSet::default(),
      tests: FnvHashMap::default(),
    };

    chart.predicted[0].insert(start.clone());
    if let Ok(alts) = rules.alternatives(&start) {
      for item in alts {
        chart.add(0, EarleyItem { item, origin: 0 });
      }
    }

    for k in 0..=len {
      let mut available = lattice.starting_at(k)
        .map(|twe| Some(twe.token.clone()))
        .collect::<FnvHashSet<Terminal>>();
      if k == len {
        available.insert(None);
      }

      let mut i = 0;
      while i < chart.sets[k].len() {
        let current = chart.sets[k][i];
        i += 1;

        match rules.head(current.item) {
          None => chart.complete(current, k),
          Some(RuleItem::Terminal(None)) => {
            chart.add(k, chart.advance(current));
          }
          Some(RuleItem::Terminal(Some(token))) => {
            let next = chart.advance(current);
            for twe in lattice.starting_at(k) {
              if twe.token == *token {
                chart.add(twe.span.end, next);
              }
            }
          }
          Some(RuleItem::NonTerminal(nt)) => {
            chart.waiting[k].entry(nt.clone()).or_default().push(current);
            if chart.empty[k].contains(nt) {
              chart.add(k, chart.advance(current));
            }
            chart.predict(nt, k, &available);
          }
        }
      }
    }

    log::trace!("chart of {} items over {} offsets",
      chart.sets.iter().map(IndexSet::len).sum::<usize>(),
      chart.sets.len());

    chart
  }

  pub fn rules(&self) -> &'g RuleSet {
    self.rules
  }

  pub fn start(&self) -> &Name {
    &self.start
  }

  pub fn input_len(&self) -> usize {
    self.sets.len() - 1
  }

  pub fn accepts(&self) -> bool {
    self.is_recognized(&self.start, 0, self.input_len())
  }

  pub fn is_recognized(&self, nt: &Name, start: usize, end: usize) -> bool {
    self.recognized.contains(&(nt.clone(), start, end))
  }

  pub fn contains(&self, offset: usize, item: EarleyItem) -> bool {
    self.sets.get(offset).map_or(false, |set| set.contains(&item))
  }

  /// Offsets at which a recognized `nt` ending at `end` starts.
  pub fn starts(&self, nt: &Name, end: usize) -> &[usize] {
    self.completed.get(&(nt.clone(), end))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// The furthest non-empty set, and the item there most telling of what
  /// was expected.
  pub fn failure(&self) -> ParseError {
    let index = self.sets.iter()
      .rposition(|set| !set.is_empty())
      .unwrap_or(0);
    let set = &self.sets[index];
    let expected = set.iter()
      .find(|e| matches!(self.rules.head(e.item), Some(RuleItem::Terminal(Some(_)))))
      .or_else(|| set.iter().find(|e| !self.rules.is_complete(e.item)))
      .or_else(|| set.first())
      .map(|e| e.item);

    ParseError::Stuck { index, expected }
  }

  fn add(&mut self, offset: usize, item: EarleyItem) {
    self.sets[offset].insert(item);
  }

  fn advance(&self, current: EarleyItem) -> EarleyItem {
    EarleyItem {
      item: self.rules.tail(current.item),
      origin: current.origin,
    }
  }

  fn predict(&mut self, nt: &Name, k: usize, available: &FnvHashSet<Terminal>) {
    if !self.predicted[k].insert(nt.clone()) || !self.worth_predicting(nt, available) {
      return;
    }

    let rules = self.rules;
    if let Ok(alts) = rules.alternatives(nt) {
      for item in alts {
        self.add(k, EarleyItem { item, origin: k });
      }
    }
  }

  /// Whether some token that can start (or follow, when `nt` is nullable)
  /// `nt` is present.
  fn worth_predicting(&mut self, nt: &Name, available: &FnvHashSet<Terminal>) -> bool {
    let rules = self.rules;
    let start = &self.start;
    let test = self.tests.entry(nt.clone())
      .or_insert_with(|| rules.test(nt, start).ok());

    match test {
      Some(test) => test.iter().any(|token| available.contains(token)),
      None => true,
    }
  }

  fn complete(&mut self, current: EarleyItem, k: usize) {
    let rules = self.rules;
    let nt = rules.nonterminal(current.item);
    let origin = current.origin;

    if self.recognized.insert((nt.clone(), origin, k)) {
      self.completed.entry((nt.clone(), k)).or_default().push(origin);
    }
    if origin == k {
      self.empty[k].insert(nt.clone());
    }

    let resumed = self.waiting[origin].get(nt)
      .map(|waiting| {
        waiting.iter().map(|&item| self.advance(item)).collect::<Vec<_>>()
      })
      .unwrap_or_default();
    for item in resumed {
      self.add(k, item);
    }
  }
}
