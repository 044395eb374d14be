use std::fmt;
use crate::Name;

/// A token name, or `None` for the empty symbol. In Follow sets `None`
/// doubles as the end-of-input marker.
pub type Terminal = Option<Name>;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum RuleItem {
  Terminal(Terminal),
  NonTerminal(Name),
}

impl RuleItem {
  pub fn terminal(token: impl Into<Name>) -> Self {
    RuleItem::Terminal(Some(token.into()))
  }

  pub fn epsilon() -> Self {
    RuleItem::Terminal(None)
  }

  pub fn nonterminal(nt: impl Into<Name>) -> Self {
    RuleItem::NonTerminal(nt.into())
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, RuleItem::Terminal(_))
  }
}

impl fmt::Display for RuleItem {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      RuleItem::Terminal(Some(token)) => write!(f, "{}", token),
      RuleItem::Terminal(None) => write!(f, "ε"),
      RuleItem::NonTerminal(nt) => write!(f, "{}", nt),
    }
  }
}

/// One alternative of a non-terminal.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Production {
  pub nt: Name,
  pub items: Vec<RuleItem>,
}

impl Production {
  pub fn new(nt: impl Into<Name>) -> Self {
    Self {
      nt: nt.into(),
      items: vec![],
    }
  }

  pub fn terminal(self, token: impl Into<Name>) -> Self {
    self.item(RuleItem::terminal(token))
  }

  pub fn epsilon(self) -> Self {
    self.item(RuleItem::epsilon())
  }

  pub fn nonterminal(self, nt: impl Into<Name>) -> Self {
    self.item(RuleItem::nonterminal(nt))
  }

  pub fn item(mut self, item: RuleItem) -> Self {
    self.items.push(item);
    self
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} ::=", self.nt)?;
    if self.items.is_empty() {
      return write!(f, " ε");
    }
    for item in &self.items {
      write!(f, " {}", item)?;
    }
    Ok(())
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ProdId(pub(crate) u32);

impl ProdId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// A dotted rule: a production plus the slot up to which it has been
/// recognized. Navigation goes through the owning [`RuleSet`](crate::RuleSet).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Item {
  prod: ProdId,
  slot: u32,
}

impl Item {
  pub fn new(prod: ProdId, slot: usize) -> Self {
    Self {
      prod,
      slot: slot as u32,
    }
  }

  pub fn prod(self) -> ProdId {
    self.prod
  }

  pub fn slot(self) -> usize {
    self.slot as usize
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use insta::assert_snapshot;

  #[test]
  fn production_display() {
    let prod = Production::new("A").terminal("'a'").nonterminal("A");
    assert_snapshot!(prod.to_string(), @"A ::= 'a' A");
    assert_snapshot!(Production::new("A").to_string(), @"A ::= ε");
    assert_snapshot!(Production::new("A").epsilon().to_string(), @"A ::= ε");
  }

  #[test]
  fn items_compare_structurally() {
    assert_eq!(RuleItem::terminal("a"), RuleItem::Terminal(Some("a".into())));
    assert_ne!(RuleItem::terminal("a"), RuleItem::nonterminal("a"));
    assert_ne!(RuleItem::epsilon(), RuleItem::terminal(""));
  }
}
