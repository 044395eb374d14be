use indexmap::{IndexMap, IndexSet};
use grammar::{Lexer, Name, Pattern, PatternOptions, Production, RuleItem, RuleSet};
use sppf::Tree;
use crate::{Specification, SpecError};

/// Lexical rule that soaks up whitespace in grammars not declared `strict`.
pub(crate) const WHITESPACE: &str = "__whitespace";

/// Turns the parse tree of a grammar description into a specification.
pub(crate) fn walk(tree: &Tree) -> Result<Specification, SpecError> {
  let mut walker = Walker::default();
  walker.spec(tree)?;
  walker.finish()
}

#[derive(Default)]
struct Walker {
  strict: bool,
  start: Option<Name>,
  absorb: Vec<Name>,
  prods: Vec<Production>,
  /// Named rules and literals, in order of appearance.
  lex_rules: IndexMap<Name, Pattern>,
}

impl Walker {
  fn spec(&mut self, tree: &Tree) -> Result<(), SpecError> {
    for child in tree.children() {
      match child.symbol() {
        "Directive" => self.directive(child)?,
        "Spec" => self.spec(child)?,
        "Rules" => self.rules(child)?,
        _ => {}
      }
    }
    Ok(())
  }

  fn directive(&mut self, tree: &Tree) -> Result<(), SpecError> {
    let children = tree.children();
    match children.first().map(Tree::symbol) {
      Some("start") => {
        if let Some(name) = children.get(1) {
          self.start = Some(name.lexeme().into());
        }
      }
      Some("strict") => self.strict = true,
      Some("absorb") => {
        for item in children.iter().skip(1).flat_map(sequence) {
          let name = self.symbol(item)?;
          self.absorb.push(name);
        }
      }
      _ => {}
    }
    Ok(())
  }

  fn rules(&mut self, tree: &Tree) -> Result<(), SpecError> {
    for child in tree.children() {
      match child.symbol() {
        "ParseRule" => self.parse_rule(child)?,
        "LexRule" => self.lex_rule(child)?,
        "Rules" => self.rules(child)?,
        _ => {}
      }
    }
    Ok(())
  }

  fn parse_rule(&mut self, tree: &Tree) -> Result<(), SpecError> {
    let children = tree.children();
    let nt = match children.first() {
      Some(id) => Name::from(id.lexeme()),
      None => return Ok(()),
    };
    for alternates in children.iter().skip(2) {
      self.alternates(&nt, alternates)?;
    }
    Ok(())
  }

  fn alternates(&mut self, nt: &Name, tree: &Tree) -> Result<(), SpecError> {
    for child in tree.children() {
      match child.symbol() {
        "Alternate" => self.alternate(nt, child)?,
        "Alternates" => self.alternates(nt, child)?,
        _ => {}
      }
    }
    Ok(())
  }

  fn alternate(&mut self, nt: &Name, tree: &Tree) -> Result<(), SpecError> {
    let mut prod = Production::new(nt.clone());
    for item in sequence(tree) {
      if item.symbol() == "eps" {
        continue;
      }
      let name = self.symbol(item)?;
      prod = match item.symbol() {
        "id" => prod.nonterminal(name),
        _ => prod.terminal(name),
      };
    }
    self.prods.push(prod);
    Ok(())
  }

  fn lex_rule(&mut self, tree: &Tree) -> Result<(), SpecError> {
    let children = tree.children();
    let (name, regex) = match children {
      [name, regex] => (Name::from(name.lexeme()), regex.lexeme()),
      _ => return Ok(()),
    };
    if self.lex_rules.contains_key(&name) {
      return Err(SpecError::DuplicateLexRule(name.to_string()));
    }

    let source = regex.strip_prefix(":=").unwrap_or(regex).trim();
    let pattern = Pattern::with_options(source, PatternOptions {
      case_insensitive: false,
      dot_matches_new_line: true,
    })?;
    self.lex_rules.insert(name, pattern);
    Ok(())
  }

  /// The name a sequence leaf stands for. Literals are registered as
  /// lexical rules under their quoted text.
  fn symbol(&mut self, leaf: &Tree) -> Result<Name, SpecError> {
    let text = leaf.lexeme();
    let (quote, case_insensitive) = match leaf.symbol() {
      "casedLiteral" => ("'", false),
      "uncasedLiteral" => ("\"", true),
      _ => return Ok(text.into()),
    };

    let name = Name::from(text);
    if !self.lex_rules.contains_key(&name) {
      let inner = text.get(1..text.len().saturating_sub(1)).unwrap_or_default();
      let inner = inner.replace(&format!("\\{}", quote), quote);
      let pattern = Pattern::literal(&inner, case_insensitive)?;
      self.lex_rules.insert(name.clone(), pattern);
    }
    Ok(name)
  }

  fn finish(mut self) -> Result<Specification, SpecError> {
    let mut referenced = IndexSet::<Name>::new();
    for prod in &mut self.prods {
      for item in &mut prod.items {
        let token = match &*item {
          RuleItem::NonTerminal(name) if self.lex_rules.contains_key(name) => name.clone(),
          RuleItem::Terminal(Some(name)) => name.clone(),
          _ => continue,
        };
        referenced.insert(token.clone());
        *item = RuleItem::Terminal(Some(token));
      }
    }

    let nonterminals = self.prods.iter()
      .map(|prod| prod.nt.clone())
      .collect::<IndexSet<_>>();
    let start = match (self.start, nonterminals.first()) {
      (Some(start), _) if nonterminals.is_empty() || nonterminals.contains(&start) => start,
      (Some(start), _) => return Err(SpecError::UnknownStart(start.to_string())),
      (None, _) if self.strict && nonterminals.len() > 1 => {
        return Err(SpecError::StrictWithoutStart);
      }
      (None, Some(first)) => first.clone(),
      (None, None) => Name::from(""),
    };

    if !self.strict {
      self.lex_rules.insert(WHITESPACE.into(), Pattern::new(r"\s+")?);
      self.absorb.push(WHITESPACE.into());
    }
    let absorb = self.absorb.iter()
      .map(|name| {
        self.lex_rules.get(name)
          .cloned()
          .ok_or_else(|| SpecError::UnknownAbsorb(name.to_string()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    let lexer = self.lex_rules.into_iter()
      .filter(|(name, _)| referenced.contains(name))
      .collect::<Lexer>();
    let rules = RuleSet::new(self.prods)?;
    log::debug!(
      "built {} non-terminals over {} tokens, starting at `{}`",
      rules.len(),
      lexer.len(),
      start
    );

    Ok(Specification::new(rules, lexer, absorb, start))
  }
}

/// Leaves of an alternative or absorb list, flattening the tail recursion.
fn sequence(tree: &Tree) -> Vec<&Tree> {
  let mut leaves = vec![];
  let mut next = Some(tree);
  while let Some(tree) = next.take() {
    for child in tree.children() {
      if child.is_leaf() {
        leaves.push(child);
      } else {
        next = Some(child);
      }
    }
  }
  leaves
}
