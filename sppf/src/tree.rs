use std::fmt;
use grammar::{Name, Span, Twe};

/// A concrete parse tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tree {
  Node {
    symbol: Name,
    span: Span,
    lexeme: Name,
    children: Vec<Tree>,
  },
  Leaf(Twe),
}

impl Tree {
  /// The non-terminal of a node, the token of a leaf.
  pub fn symbol(&self) -> &str {
    match self {
      Tree::Node { symbol, .. } => symbol,
      Tree::Leaf(twe) => &twe.token,
    }
  }

  /// All text a node spans, or the text a leaf matched.
  pub fn lexeme(&self) -> &str {
    match self {
      Tree::Node { lexeme, .. } => lexeme,
      Tree::Leaf(twe) => &twe.lexeme,
    }
  }

  pub fn span(&self) -> Span {
    match self {
      Tree::Node { span, .. } => *span,
      Tree::Leaf(twe) => twe.span,
    }
  }

  pub fn children(&self) -> &[Tree] {
    match self {
      Tree::Node { children, .. } => children,
      Tree::Leaf(_) => &[],
    }
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Tree::Leaf(_))
  }

  /// Leaf triples from left to right.
  pub fn leaves(&self) -> Vec<&Twe> {
    let mut leaves = vec![];
    let mut stack = vec![self];
    while let Some(tree) = stack.pop() {
      match tree {
        Tree::Leaf(twe) => leaves.push(twe),
        Tree::Node { children, .. } => stack.extend(children.iter().rev()),
      }
    }
    leaves
  }
}

impl fmt::Display for Tree {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Tree::Leaf(twe) => write!(f, "{}", twe),
      Tree::Node { symbol, children, .. } => {
        write!(f, "({}", symbol)?;
        for child in children {
          write!(f, " {}", child)?;
        }
        write!(f, ")")
      }
    }
  }
}
