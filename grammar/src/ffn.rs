//! compute NULLABLE, FIRST, and FOLLOW sets.

use std::sync::{Arc, PoisonError};
use bitvec::prelude::*;
use indexmap::IndexSet;
use crate::rule_set::TerminalSet;
use crate::{GrammarError, Name, Production, RuleItem, RuleSet, Set, Terminal};

pub(crate) fn compute_nullable(prods: &[Production]) -> Set<Name> {
  let mut prods_nullable = bitvec![0; prods.len()];
  let mut nullable = Set::default();

  loop {
    let mut changed = false;

    for (i, prod) in prods.iter().enumerate() {
      if prods_nullable[i] {
        continue;
      }

      let prod_nullable = prod.items.iter().all(|item| match item {
        RuleItem::Terminal(token) => token.is_none(),
        RuleItem::NonTerminal(nt) => nullable.contains(nt),
      });

      if prod_nullable {
        prods_nullable.set(i, true);
        nullable.insert(prod.nt.clone());
        changed = true;
      }
    }

    if !changed {
      break;
    }
  }

  nullable
}

/// `exclusions` holds the non-terminals on the current recursion path; they
/// contribute no terminals.
pub(crate) fn first(
  rules: &RuleSet,
  nt: &Name,
  exclusions: &[Name],
) -> Result<TerminalSet, GrammarError> {
  let key = (nt.clone(), normalize(exclusions));
  let cached = rules.first_cache.read()
    .unwrap_or_else(PoisonError::into_inner)
    .get(&key)
    .cloned();
  if let Some(set) = cached {
    return Ok(set);
  }

  let mut path = exclusions.to_vec();
  path.push(nt.clone());

  let mut set = IndexSet::new();
  for &prod in rules.prod_ids(nt)? {
    first_of_sequence(rules, &rules.production(prod).items, &path, &mut set)?;
  }

  let set = Arc::new(set);
  rules.first_cache.write()
    .unwrap_or_else(PoisonError::into_inner)
    .insert(key, set.clone());
  Ok(set)
}

/// Folds the First set of `items` into `out`, adding `None` when all of them
/// are nullable.
pub(crate) fn first_of_sequence(
  rules: &RuleSet,
  items: &[RuleItem],
  exclusions: &[Name],
  out: &mut IndexSet<Terminal>,
) -> Result<(), GrammarError> {
  for item in items {
    match item {
      RuleItem::Terminal(None) => {}
      RuleItem::Terminal(Some(token)) => {
        out.insert(Some(token.clone()));
        return Ok(());
      }
      RuleItem::NonTerminal(nt) => {
        if !exclusions.contains(nt) {
          let nt_first = first(rules, nt, exclusions)?;
          out.extend(nt_first.iter().filter(|token| token.is_some()).cloned());
        }
        if !rules.is_nullable(nt) {
          return Ok(());
        }
      }
    }
  }

  out.insert(None);
  Ok(())
}

pub(crate) fn follow(
  rules: &RuleSet,
  nt: &Name,
  start: &Name,
  exclusions: &[Name],
) -> Result<TerminalSet, GrammarError> {
  let key = (nt.clone(), start.clone(), normalize(exclusions));
  let cached = rules.follow_cache.read()
    .unwrap_or_else(PoisonError::into_inner)
    .get(&key)
    .cloned();
  if let Some(set) = cached {
    return Ok(set);
  }

  let mut path = exclusions.to_vec();
  path.push(nt.clone());

  let mut set = IndexSet::new();
  if nt == start {
    set.insert(None);
  }

  for prod in rules.prods() {
    for (i, item) in prod.items.iter().enumerate() {
      match item {
        RuleItem::NonTerminal(sym) if sym == nt => {}
        _ => continue,
      }

      let mut rest = IndexSet::new();
      first_of_sequence(rules, &prod.items[i + 1..], &[], &mut rest)?;
      let rest_nullable = rest.contains(&None);
      set.extend(rest.into_iter().filter(Option::is_some));

      if rest_nullable && !path.contains(&prod.nt) {
        set.extend(follow(rules, &prod.nt, start, &path)?.iter().cloned());
      }
    }
  }

  let set = Arc::new(set);
  rules.follow_cache.write()
    .unwrap_or_else(PoisonError::into_inner)
    .insert(key, set.clone());
  Ok(set)
}

fn normalize(exclusions: &[Name]) -> Vec<Name> {
  let mut exclusions = exclusions.to_vec();
  exclusions.sort();
  exclusions.dedup();
  exclusions
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn nullable_fixpoint() {
    let prods = vec![
      Production::new("A").nonterminal("B").nonterminal("C"),
      Production::new("B").nonterminal("C"),
      Production::new("C").epsilon(),
      Production::new("C").terminal("c"),
      Production::new("D").terminal("d").nonterminal("C"),
      Production::new("E").nonterminal("E"),
    ];
    let nullable = compute_nullable(&prods);

    let mut names = nullable.iter().map(|name| name.to_string()).collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["A", "B", "C"]);
  }
}
