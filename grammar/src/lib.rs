use std::sync::Arc;

mod rule;
mod rule_set;
mod ffn;

pub mod lexer;

pub use rule::*;
pub use rule_set::*;
pub use lexer::{
  Lattice, LexError, LexMode, Lexer, Pattern, PatternError, PatternOptions,
  Span, Twe,
};

/// Symbol and token names. Cloning only bumps a reference count.
pub type Name = Arc<str>;

#[cfg(not(debug_assertions))]
pub(crate) type Set<K> = std::collections::HashSet<K>;

#[cfg(debug_assertions)]
pub(crate) type Set<K> = indexmap::IndexSet<K>;
