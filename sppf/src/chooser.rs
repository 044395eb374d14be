use fnv::{FnvHashMap, FnvHashSet};
use grammar::{Lattice, Name};

/// Filters the token lattice of one input before it is parsed.
pub type Chooser = dyn Fn(Lattice) -> Lattice + Send + Sync;

/// Keeps only the longest match of each token at each offset, then drops
/// whatever no longer lies on a path from the start of input to its end.
pub fn longest_match_dead_branch_prune(lattice: Lattice) -> Lattice {
  let mut longest = FnvHashMap::<(usize, Name), usize>::default();
  for twe in &lattice {
    let end = longest.entry((twe.span.start, twe.token.clone())).or_insert(0);
    *end = (*end).max(twe.unabsorbed.end);
  }

  let lattice = lattice.filter(|twe| {
    longest.get(&(twe.span.start, twe.token.clone())) == Some(&twe.unabsorbed.end)
  });
  prune_dead_branches(lattice)
}

/// Drops triples unreachable from offset 0 and triples from which the end
/// of input is unreachable.
pub fn prune_dead_branches(lattice: Lattice) -> Lattice {
  let len = lattice.input_len();

  let mut reachable = FnvHashSet::default();
  reachable.insert(0);
  let mut stack = vec![0];
  while let Some(offset) = stack.pop() {
    for twe in lattice.starting_at(offset) {
      if reachable.insert(twe.span.end) {
        stack.push(twe.span.end);
      }
    }
  }

  let mut live = FnvHashSet::default();
  live.insert(len);
  stack.push(len);
  while let Some(offset) = stack.pop() {
    for twe in lattice.ending_at(offset) {
      if live.insert(twe.span.start) {
        stack.push(twe.span.start);
      }
    }
  }

  lattice.filter(|twe| {
    reachable.contains(&twe.span.start) && live.contains(&twe.span.end)
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use grammar::{LexMode, Lexer, Pattern};
  use pretty_assertions::assert_eq;

  fn lexer(tokens: &[(&str, &str)]) -> Lexer {
    tokens.iter()
      .map(|&(name, source)| (Name::from(name), Pattern::new(source).unwrap()))
      .collect()
  }

  #[test]
  fn longest_match_per_token() {
    let lexer = lexer(&[("a", "a+")]);
    let lattice = lexer.lex("aaa", &[], LexMode::Ambiguous).unwrap();
    assert_eq!(lattice.len(), 6);

    let pruned = longest_match_dead_branch_prune(lattice);
    assert_eq!(pruned.spans(), vec![(0, 3)]);
  }

  #[test]
  fn different_tokens_survive_together() {
    let lexer = lexer(&[("kw", "if"), ("id", "[a-z]+"), ("sp", " ")]);
    let lattice = lexer.lex("if x", &[], LexMode::Ambiguous).unwrap();
    let pruned = longest_match_dead_branch_prune(lattice);

    let mut found = pruned.iter()
      .map(|twe| (twe.token.to_string(), twe.span.start, twe.span.end))
      .collect::<Vec<_>>();
    found.sort();
    assert_eq!(found, vec![
      ("id".to_owned(), 0, 2),
      ("id".to_owned(), 3, 4),
      ("kw".to_owned(), 0, 2),
      ("sp".to_owned(), 2, 3),
    ]);
  }

  #[test]
  fn dead_ends_are_dropped() {
    let lexer = lexer(&[("ab", "ab"), ("a", "a"), ("c", "c")]);
    let lattice = lexer.lex("abc", &[], LexMode::Ambiguous).unwrap();
    assert_eq!(lattice.len(), 3);

    let pruned = prune_dead_branches(lattice);
    assert_eq!(pruned.spans(), vec![(0, 2), (2, 3)]);
  }
}
