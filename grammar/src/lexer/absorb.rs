//! Folding filler (whitespace, comments, ...) into the preceding token.

use std::collections::VecDeque;
use fnv::FnvHashSet;
use indexmap::IndexMap;
use crate::Name;
use super::{Pattern, Twe};

/// The furthest offset reachable from `from` by chaining non-empty filler
/// matches.
pub(crate) fn reach(input: &str, from: usize, absorb: &[Pattern]) -> usize {
  if absorb.is_empty() {
    return from;
  }

  let mut frontier = VecDeque::from([from]);
  let mut explored = FnvHashSet::default();
  explored.insert(from);
  let mut furthest = from;

  while let Some(offset) = frontier.pop_front() {
    furthest = furthest.max(offset);
    for pattern in absorb {
      for len in pattern.match_ends(&input[offset..]) {
        if len > 0 && explored.insert(offset + len) {
          frontier.push_back(offset + len);
        }
      }
    }
  }

  furthest
}

/// Triples of one token sharing start, match start and end differ only in
/// how the text up to the end was split between match and filler. When one
/// lexeme extends another by pure filler the shorter one is dropped, so the
/// triple that absorbed the least survives.
pub(crate) fn drop_redundant(triples: Vec<Twe>, absorb: &[Pattern]) -> Vec<Twe> {
  if absorb.is_empty() {
    return triples;
  }

  let mut groups = IndexMap::<(Name, usize, usize, usize), Vec<Twe>>::new();
  for twe in triples {
    let key = (twe.token.clone(), twe.span.start, twe.unabsorbed.start, twe.span.end);
    groups.entry(key).or_default().push(twe);
  }

  let mut kept = vec![];
  for (_, mut group) in groups {
    if group.len() == 1 {
      kept.append(&mut group);
      continue;
    }

    group.sort_by(|a, b| b.lexeme.len().cmp(&a.lexeme.len()));
    let mut survivors: Vec<Twe> = vec![];
    for twe in group {
      let redundant = survivors.iter().any(|longer| {
        longer.lexeme.len() > twe.lexeme.len()
          && longer.lexeme.starts_with(&*twe.lexeme)
          && absorb.iter().any(|p| p.is_match(&longer.lexeme[twe.lexeme.len()..]))
      });
      if !redundant {
        survivors.push(twe);
      }
    }
    kept.append(&mut survivors);
  }

  kept
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reach_chains_patterns() {
    let absorb = vec![
      Pattern::new(r"\s+").unwrap(),
      Pattern::new(r"//[^\n]*\n").unwrap(),
    ];
    let input = "x  // note\n  y";

    assert_eq!(reach(input, 1, &absorb), 13);
    assert_eq!(reach(input, 0, &absorb), 0);
    assert_eq!(reach(input, 1, &[]), 1);
  }

  #[test]
  fn empty_filler_is_ignored() {
    let absorb = vec![Pattern::new(r"\s*").unwrap()];
    assert_eq!(reach("ab", 1, &absorb), 1);
  }
}
