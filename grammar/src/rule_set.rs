use std::error;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use fnv::{FnvHashMap, FnvHashSet};
use indexmap::{IndexMap, IndexSet};
use crate::{ffn, Item, Name, ProdId, Production, RuleItem, Set, Terminal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
  /// A query named a non-terminal that has no alternatives.
  UnknownNonterminal(Name),
  /// A production body references a non-terminal that has no alternatives.
  UndefinedNonterminal {
    name: Name,
    referenced_by: Name,
  },
}

impl fmt::Display for GrammarError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      GrammarError::UnknownNonterminal(name) => {
        write!(f, "unknown non-terminal `{}`", name)
      }
      GrammarError::UndefinedNonterminal { name, referenced_by } => {
        write!(f, "non-terminal `{}` referenced by `{}` is not defined",
          name, referenced_by)
      }
    }
  }
}

impl error::Error for GrammarError {}

pub(crate) type FirstKey = (Name, Vec<Name>);
pub(crate) type FollowKey = (Name, Name, Vec<Name>);
/// Terminals in the order the analysis met them.
pub type TerminalSet = Arc<IndexSet<Terminal>>;

/// An immutable grammar: the alternatives of every non-terminal, plus lazily
/// memoized First and Follow sets.
#[derive(Debug)]
pub struct RuleSet {
  prods: Vec<Production>,
  alts: IndexMap<Name, Vec<ProdId>>,
  nullable: Set<Name>,
  pub(crate) first_cache: RwLock<FnvHashMap<FirstKey, TerminalSet>>,
  pub(crate) follow_cache: RwLock<FnvHashMap<FollowKey, TerminalSet>>,
}

impl RuleSet {
  /// Structurally equal productions are kept once. Every non-terminal used in
  /// a body must have at least one alternative.
  pub fn new(
    prods: impl IntoIterator<Item = Production>
  ) -> Result<Self, GrammarError> {
    let mut seen = FnvHashSet::default();
    let mut table = vec![];
    let mut alts = IndexMap::<Name, Vec<ProdId>>::new();

    for prod in prods {
      if !seen.insert(prod.clone()) {
        continue;
      }
      let id = ProdId(table.len() as u32);
      alts.entry(prod.nt.clone()).or_default().push(id);
      table.push(prod);
    }

    for prod in &table {
      for item in &prod.items {
        if let RuleItem::NonTerminal(nt) = item {
          if !alts.contains_key(nt) {
            return Err(GrammarError::UndefinedNonterminal {
              name: nt.clone(),
              referenced_by: prod.nt.clone(),
            });
          }
        }
      }
    }

    let nullable = ffn::compute_nullable(&table);

    Ok(Self {
      prods: table,
      alts,
      nullable,
      first_cache: RwLock::default(),
      follow_cache: RwLock::default(),
    })
  }

  /// Number of non-terminals.
  pub fn len(&self) -> usize {
    self.alts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.alts.is_empty()
  }

  pub fn contains(&self, nt: &str) -> bool {
    self.alts.contains_key(nt)
  }

  /// Non-terminals in order of first definition.
  pub fn nonterminals(&self) -> impl Iterator<Item = &Name> {
    self.alts.keys()
  }

  pub fn productions(&self) -> impl Iterator<Item = (ProdId, &Production)> {
    self.prods.iter().enumerate()
      .map(|(i, prod)| (ProdId(i as u32), prod))
  }

  pub fn production(&self, id: ProdId) -> &Production {
    &self.prods[id.index()]
  }

  /// Alternatives of `nt`, dotted at slot 0.
  pub fn alternatives(
    &self,
    nt: &str
  ) -> Result<impl Iterator<Item = Item> + '_, GrammarError> {
    Ok(self.prod_ids(nt)?.iter().map(|&prod| Item::new(prod, 0)))
  }

  pub fn is_nullable(&self, nt: &str) -> bool {
    self.nullable.contains(nt)
  }

  pub fn head(&self, item: Item) -> Option<&RuleItem> {
    self.production(item.prod()).items.get(item.slot())
  }

  pub fn tail(&self, item: Item) -> Item {
    let len = self.production(item.prod()).len();
    Item::new(item.prod(), (item.slot() + 1).min(len))
  }

  pub fn previous(&self, item: Item) -> Item {
    Item::new(item.prod(), item.slot().saturating_sub(1))
  }

  pub fn is_complete(&self, item: Item) -> bool {
    item.slot() >= self.production(item.prod()).len()
  }

  /// The non-terminal `item` belongs to.
  pub fn nonterminal(&self, item: Item) -> &Name {
    &self.production(item.prod()).nt
  }

  pub fn display_item(&self, item: Item) -> DisplayItem<'_> {
    DisplayItem {
      rules: self,
      item,
    }
  }

  /// Terminals that can begin a derivation of `nt`; contains `None` when
  /// `nt` is nullable.
  pub fn first(&self, nt: &str) -> Result<TerminalSet, GrammarError> {
    let nt = self.name(nt)?;
    ffn::first(self, nt, &[])
  }

  pub fn first_item(&self, item: &RuleItem) -> Result<TerminalSet, GrammarError> {
    match item {
      RuleItem::Terminal(token) => {
        Ok(Arc::new(std::iter::once(token.clone()).collect()))
      }
      RuleItem::NonTerminal(nt) => self.first(nt),
    }
  }

  /// Terminals that can follow `nt` in derivations from `start`. Contains
  /// `None` when `nt` can end such a derivation.
  pub fn follow(&self, nt: &str, start: &str) -> Result<TerminalSet, GrammarError> {
    let nt = self.name(nt)?;
    let start = self.name(start)?;
    ffn::follow(self, nt, start, &[])
  }

  /// The terminals that make predicting `nt` worthwhile: First, and Follow as
  /// well when `nt` is nullable.
  pub fn test(&self, nt: &str, start: &str) -> Result<TerminalSet, GrammarError> {
    let first = self.first(nt)?;
    if !self.is_nullable(nt) {
      return Ok(first);
    }

    let mut set = first.iter()
      .filter(|token| token.is_some())
      .cloned()
      .collect::<IndexSet<_>>();
    set.extend(self.follow(nt, start)?.iter().cloned());
    Ok(Arc::new(set))
  }

  pub(crate) fn prod_ids(&self, nt: &str) -> Result<&[ProdId], GrammarError> {
    self.alts.get(nt)
      .map(Vec::as_slice)
      .ok_or_else(|| GrammarError::UnknownNonterminal(nt.into()))
  }

  fn name(&self, nt: &str) -> Result<&Name, GrammarError> {
    self.alts.get_key_value(nt)
      .map(|(name, _)| name)
      .ok_or_else(|| GrammarError::UnknownNonterminal(nt.into()))
  }

  pub(crate) fn prods(&self) -> &[Production] {
    &self.prods
  }
}

impl Clone for RuleSet {
  fn clone(&self) -> Self {
    let first = self.first_cache.read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();
    let follow = self.follow_cache.read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();

    Self {
      prods: self.prods.clone(),
      alts: self.alts.clone(),
      nullable: self.nullable.clone(),
      first_cache: RwLock::new(first),
      follow_cache: RwLock::new(follow),
    }
  }
}

impl Default for RuleSet {
  fn default() -> Self {
    Self {
      prods: vec![],
      alts: IndexMap::new(),
      nullable: Set::default(),
      first_cache: RwLock::default(),
      follow_cache: RwLock::default(),
    }
  }
}

impl PartialEq for RuleSet {
  fn eq(&self, other: &Self) -> bool {
    self.prods == other.prods
  }
}

impl Eq for RuleSet {}

impl fmt::Display for RuleSet {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for prod in &self.prods {
      writeln!(f, "{}", prod)?;
    }
    Ok(())
  }
}

pub struct DisplayItem<'a> {
  rules: &'a RuleSet,
  item: Item,
}

impl<'a> fmt::Display for DisplayItem<'a> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let prod = self.rules.production(self.item.prod());
    write!(f, "{} ::=", prod.nt)?;
    for (i, item) in prod.items.iter().enumerate() {
      if i == self.item.slot() {
        write!(f, " ·")?;
      }
      write!(f, " {}", item)?;
    }
    if self.item.slot() >= prod.items.len() {
      write!(f, " ·")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use insta::assert_snapshot;
  use pretty_assertions::assert_eq;

  fn terminals(names: &[Option<&str>]) -> IndexSet<Terminal> {
    names.iter().map(|name| name.map(Name::from)).collect()
  }

  fn sorted(set: &IndexSet<Terminal>) -> Vec<Terminal> {
    let mut v = set.iter().cloned().collect::<Vec<_>>();
    v.sort();
    v
  }

  fn repeat_a() -> RuleSet {
    RuleSet::new(vec![
      Production::new("A").terminal("'a'").nonterminal("A"),
      Production::new("A"),
    ]).unwrap()
  }

  #[test]
  fn first_of_right_recursion() {
    let rules = repeat_a();
    let first = rules.first("A").unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(sorted(&first), sorted(&terminals(&[Some("'a'"), None])));
  }

  #[test]
  fn first_of_single_items() {
    let rules = repeat_a();

    let token = RuleItem::terminal("'a'");
    assert!(token.is_terminal());
    assert_eq!(sorted(&rules.first_item(&token).unwrap()), vec![Some("'a'".into())]);

    let empty = RuleItem::epsilon();
    assert!(empty.is_terminal());
    assert_eq!(sorted(&rules.first_item(&empty).unwrap()), vec![None]);

    let nt = RuleItem::nonterminal("A");
    assert!(!nt.is_terminal());
    assert_eq!(rules.first_item(&nt).unwrap(), rules.first("A").unwrap());
    assert!(rules.first_item(&RuleItem::nonterminal("B")).is_err());
  }

  #[test]
  fn follow_through_nullable_suffix() {
    let rules = RuleSet::new(vec![
      Production::new("S").nonterminal("A").nonterminal("A"),
      Production::new("A").terminal("'a'").nonterminal("A"),
      Production::new("A"),
    ]).unwrap();
    let follow = rules.follow("A", "S").unwrap();

    assert_eq!(follow.len(), 2);
    assert_eq!(sorted(&follow), sorted(&terminals(&[Some("'a'"), None])));
  }

  #[test]
  fn left_recursion_terminates() {
    let rules = RuleSet::new(vec![
      Production::new("E").nonterminal("E").terminal("+").nonterminal("T"),
      Production::new("E").nonterminal("T"),
      Production::new("T").nonterminal("T").terminal("*").nonterminal("F"),
      Production::new("T").nonterminal("F"),
      Production::new("F").terminal("(").nonterminal("E").terminal(")"),
      Production::new("F").terminal("id"),
    ]).unwrap();

    assert_eq!(
      sorted(&rules.first("E").unwrap()),
      sorted(&terminals(&[Some("("), Some("id")])));
    assert_eq!(
      sorted(&rules.follow("F", "E").unwrap()),
      sorted(&terminals(&[Some("*"), Some("+"), Some(")"), None])));
    assert_eq!(
      sorted(&rules.follow("E", "E").unwrap()),
      sorted(&terminals(&[Some("+"), Some(")"), None])));
  }

  #[test]
  fn mutual_recursion_through_nullable_heads() {
    let rules = RuleSet::new(vec![
      Production::new("A").nonterminal("B").terminal("a"),
      Production::new("B").nonterminal("A").terminal("b"),
      Production::new("B"),
    ]).unwrap();

    assert!(!rules.is_nullable("A"));
    assert!(rules.is_nullable("B"));
    assert_eq!(sorted(&rules.first("A").unwrap()), sorted(&terminals(&[Some("a")])));
    assert_eq!(
      sorted(&rules.first("B").unwrap()),
      sorted(&terminals(&[Some("a"), None])));
  }

  #[test]
  fn test_set_adds_follow_for_nullable() {
    let rules = RuleSet::new(vec![
      Production::new("S").nonterminal("A").terminal("b"),
      Production::new("A").terminal("a"),
      Production::new("A").epsilon(),
    ]).unwrap();

    assert_eq!(
      sorted(&rules.test("A", "S").unwrap()),
      sorted(&terminals(&[Some("a"), Some("b")])));
    assert_eq!(
      sorted(&rules.test("S", "S").unwrap()),
      sorted(&terminals(&[Some("a"), Some("b")])));
  }

  #[test]
  fn unknown_nonterminal_is_an_error() {
    let rules = repeat_a();
    assert_eq!(
      rules.first("B").unwrap_err(),
      GrammarError::UnknownNonterminal("B".into()));
    assert_eq!(
      rules.follow("A", "S").unwrap_err(),
      GrammarError::UnknownNonterminal("S".into()));

    let empty = RuleSet::new(vec![]).unwrap();
    assert!(empty.is_empty());
    assert!(empty.first("A").is_err());
  }

  #[test]
  fn undefined_reference_is_rejected() {
    let err = RuleSet::new(vec![
      Production::new("A").nonterminal("B"),
    ]).unwrap_err();

    assert_eq!(err, GrammarError::UndefinedNonterminal {
      name: "B".into(),
      referenced_by: "A".into(),
    });
  }

  #[test]
  fn duplicate_productions_are_merged() {
    let rules = RuleSet::new(vec![
      Production::new("A").terminal("a"),
      Production::new("A").terminal("a"),
      Production::new("A"),
    ]).unwrap();

    assert_eq!(rules.alternatives("A").unwrap().count(), 2);
  }

  #[test]
  fn item_navigation() {
    let rules = repeat_a();
    let item = rules.alternatives("A").unwrap().next().unwrap();

    assert_snapshot!(rules.display_item(item).to_string(), @"A ::= · 'a' A");
    assert_eq!(rules.head(item), Some(&RuleItem::terminal("'a'")));
    assert_eq!(rules.previous(item), item);

    let item = rules.tail(item);
    assert_snapshot!(rules.display_item(item).to_string(), @"A ::= 'a' · A");

    let item = rules.tail(rules.tail(item));
    assert!(rules.is_complete(item));
    assert_eq!(rules.head(item), None);
    assert_eq!(item.slot(), 2);
    assert_snapshot!(rules.display_item(item).to_string(), @"A ::= 'a' A ·");
    assert_eq!(rules.nonterminal(item).as_ref(), "A");
  }

  #[test]
  fn concurrent_queries_agree() {
    let rules = repeat_a();
    let expected = sorted(&rules.first("A").unwrap());

    std::thread::scope(|scope| {
      let handles = (0..4)
        .map(|_| scope.spawn(|| sorted(&rules.follow("A", "A").unwrap())))
        .collect::<Vec<_>>();
      for handle in handles {
        assert_eq!(handle.join().unwrap(), vec![None]);
      }
    });
    assert_eq!(sorted(&rules.first("A").unwrap()), expected);
  }
}
