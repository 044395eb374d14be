use fnv::{FnvHashMap, FnvHashSet};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use grammar::{Item, Lattice, Name, ProdId, RuleItem, Span, Twe};
use crate::chart::{Chart, EarleyItem};
use crate::Tree;

/// Index of a node in its forest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Child {
  Leaf(Twe),
  Node(NodeId),
}

/// One way of deriving a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packed {
  pub prod: ProdId,
  pub children: Vec<Child>,
}

#[derive(Clone, Debug)]
pub struct Node {
  pub symbol: Name,
  pub span: Span,
  pub lexeme: Name,
  pub packed: Vec<Packed>,
}

impl Node {
  pub fn is_ambiguous(&self) -> bool {
    self.packed.len() > 1
  }

  fn tree(&self, children: Vec<Tree>) -> Tree {
    Tree::Node {
      symbol: self.symbol.clone(),
      span: self.span,
      lexeme: self.lexeme.clone(),
      children,
    }
  }
}

/// Shared packed parse forest: one node per recognized (symbol, start, end),
/// each derivation of it a packed alternative. Children refer to nodes by
/// id, so cyclic derivations need no special treatment.
#[derive(Clone, Debug)]
pub struct Forest {
  nodes: IndexMap<(Name, usize, usize), Node>,
}

impl Forest {
  pub(crate) fn build(chart: &Chart, lattice: &Lattice, input: &str) -> Self {
    let mut builder = Builder {
      chart,
      lattice,
      input,
      nodes: IndexMap::new(),
      pending: vec![],
    };
    builder.intern(chart.start().clone(), 0, chart.input_len());

    while let Some(id) = builder.pending.pop() {
      builder.pack(id);
    }

    Self {
      nodes: builder.nodes,
    }
  }

  pub fn root_id(&self) -> NodeId {
    NodeId(0)
  }

  pub fn root(&self) -> &Node {
    &self.nodes[0]
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  /// Looks up the node for `symbol` over `start..end`.
  pub fn find(&self, symbol: &str, start: usize, end: usize) -> Option<NodeId> {
    self.nodes.get_index_of(&(Name::from(symbol), start, end)).map(NodeId)
  }

  /// Number of nodes.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn symbol(&self) -> &str {
    &self.root().symbol
  }

  pub fn lexeme(&self) -> &str {
    &self.root().lexeme
  }

  pub fn is_ambiguous(&self) -> bool {
    self.nodes.values().any(Node::is_ambiguous)
  }

  /// Every distinct concrete tree. Derivations that re-enter a node already
  /// being expanded are skipped, so cyclic forests yield finitely many trees.
  pub fn trees(&self) -> Vec<Tree> {
    let mut enumerator = Enumerator {
      forest: self,
      path: FnvHashSet::default(),
      memo: FnvHashMap::default(),
      memoize: !self.is_cyclic(),
    };
    enumerator.expand(self.root_id())
  }

  fn is_cyclic(&self) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
      New,
      Active,
      Done,
    }

    fn visit(forest: &Forest, id: NodeId, marks: &mut [Mark]) -> bool {
      match marks[id.0] {
        Mark::Active => return true,
        Mark::Done => return false,
        Mark::New => {}
      }

      marks[id.0] = Mark::Active;
      for packed in &forest.node(id).packed {
        for child in &packed.children {
          if let Child::Node(child) = child {
            if visit(forest, *child, marks) {
              return true;
            }
          }
        }
      }
      marks[id.0] = Mark::Done;
      false
    }

    let mut marks = vec![Mark::New; self.nodes.len()];
    !self.is_empty() && visit(self, self.root_id(), &mut marks)
  }
}

struct Builder<'a, 'g> {
  chart: &'a Chart<'g>,
  lattice: &'a Lattice,
  input: &'a str,
  nodes: IndexMap<(Name, usize, usize), Node>,
  pending: Vec<NodeId>,
}

impl<'a, 'g> Builder<'a, 'g> {
  fn intern(&mut self, symbol: Name, start: usize, end: usize) -> NodeId {
    let key = (symbol, start, end);
    if let Some(index) = self.nodes.get_index_of(&key) {
      return NodeId(index);
    }

    let node = Node {
      symbol: key.0.clone(),
      span: Span::new(start, end),
      lexeme: self.input.get(start..end).unwrap_or_default().into(),
      packed: vec![],
    };
    let (index, _) = self.nodes.insert_full(key, node);
    self.pending.push(NodeId(index));
    NodeId(index)
  }

  /// Collects every derivation of a node from the chart.
  fn pack(&mut self, id: NodeId) {
    let rules = self.chart.rules();
    let (symbol, span) = {
      let node = &self.nodes[id.0];
      (node.symbol.clone(), node.span)
    };

    let mut packed = vec![];
    for item in rules.alternatives(&symbol).into_iter().flatten() {
      let prod = item.prod();
      let len = rules.production(prod).len();
      let done = EarleyItem {
        item: Item::new(prod, len),
        origin: span.start,
      };
      if !self.chart.contains(span.end, done) {
        continue;
      }

      let mut derivations = vec![];
      self.derive(prod, len, span.end, span.start, &mut vec![], &mut derivations);
      for children in derivations {
        let alt = Packed { prod, children };
        if !packed.contains(&alt) {
          packed.push(alt);
        }
      }
    }

    self.nodes[id.0].packed = packed;
  }

  /// Walks `prod` right to left from `slot`, splitting `origin..end` among
  /// its items in every way the chart supports. `suffix` holds the children
  /// already chosen for the items after `slot`, last first.
  fn derive(
    &mut self,
    prod: ProdId,
    slot: usize,
    end: usize,
    origin: usize,
    suffix: &mut Vec<Child>,
    out: &mut Vec<Vec<Child>>,
  ) {
    if slot == 0 {
      if end == origin {
        out.push(suffix.iter().rev().cloned().collect());
      }
      return;
    }

    let chart = self.chart;
    let lattice = self.lattice;
    let rules = chart.rules();
    let prev = EarleyItem {
      item: Item::new(prod, slot - 1),
      origin,
    };

    match &rules.production(prod).items[slot - 1] {
      RuleItem::Terminal(None) => {
        if chart.contains(end, prev) {
          self.derive(prod, slot - 1, end, origin, suffix, out);
        }
      }
      RuleItem::Terminal(Some(token)) => {
        for twe in lattice.ending_at(end) {
          if twe.token != *token || !chart.contains(twe.span.start, prev) {
            continue;
          }
          suffix.push(Child::Leaf(twe.clone()));
          self.derive(prod, slot - 1, twe.span.start, origin, suffix, out);
          suffix.pop();
        }
      }
      RuleItem::NonTerminal(nt) => {
        for &start in chart.starts(nt, end) {
          if start < origin || !chart.contains(start, prev) {
            continue;
          }
          let child = self.intern(nt.clone(), start, end);
          suffix.push(Child::Node(child));
          self.derive(prod, slot - 1, start, origin, suffix, out);
          suffix.pop();
        }
      }
    }
  }
}

struct Enumerator<'f> {
  forest: &'f Forest,
  path: FnvHashSet<NodeId>,
  memo: FnvHashMap<NodeId, Vec<Tree>>,
  memoize: bool,
}

impl<'f> Enumerator<'f> {
  fn expand(&mut self, id: NodeId) -> Vec<Tree> {
    if let Some(trees) = self.memo.get(&id) {
      return trees.clone();
    }

    let forest = self.forest;
    let node = forest.node(id);
    self.path.insert(id);

    let mut trees = IndexSet::<Tree>::new();
    for packed in &node.packed {
      let reenters = packed.children.iter().any(|child| {
        matches!(child, Child::Node(child) if self.path.contains(child))
      });
      if reenters {
        continue;
      }

      if packed.children.is_empty() {
        trees.insert(node.tree(vec![]));
        continue;
      }

      let mut choices = Vec::with_capacity(packed.children.len());
      for child in &packed.children {
        choices.push(match child {
          Child::Leaf(twe) => vec![Tree::Leaf(twe.clone())],
          Child::Node(child) => self.expand(*child),
        });
      }
      if choices.iter().any(Vec::is_empty) {
        continue;
      }

      for children in choices.into_iter().multi_cartesian_product() {
        trees.insert(node.tree(children));
      }
    }

    self.path.remove(&id);

    let trees = trees.into_iter().collect::<Vec<_>>();
    if self.memoize {
      self.memo.insert(id, trees.clone());
    }
    trees
  }
}
