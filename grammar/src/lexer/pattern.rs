use std::error;
use std::fmt;
use regex::{Regex, RegexBuilder};
use regex_automata::dfa::{dense, Automaton, StartKind};
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, MatchKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PatternOptions {
  pub case_insensitive: bool,
  pub dot_matches_new_line: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
  pub pattern: String,
  pub message: String,
}

impl fmt::Display for PatternError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "invalid pattern `{}`: {}", self.pattern, self.message)
  }
}

impl error::Error for PatternError {}

/// A regular expression that only ever matches whole candidates. Besides the
/// plain full-match test it can report, in one pass, every prefix of a text
/// the expression matches.
#[derive(Clone)]
pub struct Pattern {
  source: String,
  options: PatternOptions,
  full: Regex,
  /// `None` when the expression needs features the DFA lacks.
  prefixes: Option<dense::DFA<Vec<u32>>>,
}

impl Pattern {
  pub fn new(source: &str) -> Result<Self, PatternError> {
    Self::with_options(source, PatternOptions::default())
  }

  pub fn with_options(
    source: &str,
    options: PatternOptions
  ) -> Result<Self, PatternError> {
    let body = strip_anchors(source);
    let full = RegexBuilder::new(&format!("^(?:{})$", body))
      .case_insensitive(options.case_insensitive)
      .dot_matches_new_line(options.dot_matches_new_line)
      .build()
      .map_err(|err| PatternError {
        pattern: source.to_owned(),
        message: err.to_string(),
      })?;

    let prefixes = match build_prefix_dfa(body, options) {
      Ok(dfa) => Some(dfa),
      Err(err) => {
        log::trace!("pattern `{}` scans prefixes one by one: {}", source, err);
        None
      }
    };

    Ok(Self {
      source: source.to_owned(),
      options,
      full,
      prefixes,
    })
  }

  /// Matches `text` verbatim.
  pub fn literal(text: &str, case_insensitive: bool) -> Result<Self, PatternError> {
    Self::with_options(&regex::escape(text), PatternOptions {
      case_insensitive,
      dot_matches_new_line: false,
    })
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn options(&self) -> PatternOptions {
    self.options
  }

  pub fn is_match(&self, text: &str) -> bool {
    self.full.is_match(text)
  }

  /// Lengths of every prefix of `text` the pattern matches, ascending.
  pub fn match_ends(&self, text: &str) -> Vec<usize> {
    self.prefixes.as_ref()
      .and_then(|dfa| dfa_match_ends(dfa, text))
      .unwrap_or_else(|| self.scan_match_ends(text))
  }

  fn scan_match_ends(&self, text: &str) -> Vec<usize> {
    (0..=text.len())
      .filter(|&end| text.is_char_boundary(end) && self.full.is_match(&text[..end]))
      .collect()
  }
}

impl fmt::Debug for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Pattern")
      .field("source", &self.source)
      .field("options", &self.options)
      .finish()
  }
}

impl PartialEq for Pattern {
  fn eq(&self, other: &Self) -> bool {
    self.source == other.source && self.options == other.options
  }
}

impl Eq for Pattern {}

/// Matching is always anchored at both ends, so explicit anchors are noise.
fn strip_anchors(source: &str) -> &str {
  let body = source.strip_prefix('^').unwrap_or(source);
  match body.strip_suffix('$') {
    Some(stripped) if !stripped.ends_with('\\') => stripped,
    _ => body,
  }
}

fn build_prefix_dfa(
  body: &str,
  options: PatternOptions,
) -> Result<dense::DFA<Vec<u32>>, dense::BuildError> {
  dense::Builder::new()
    .configure(dense::Config::new()
      .match_kind(MatchKind::All)
      .start_kind(StartKind::Anchored))
    .syntax(syntax::Config::new()
      .case_insensitive(options.case_insensitive)
      .dot_matches_new_line(options.dot_matches_new_line))
    .build(body)
}

/// `None` if the DFA gave up, in which case the caller rescans.
fn dfa_match_ends(dfa: &dense::DFA<Vec<u32>>, text: &str) -> Option<Vec<usize>> {
  let input = Input::new(text).anchored(Anchored::Yes);
  let mut state = dfa.start_state_forward(&input).ok()?;
  let mut ends = vec![];

  for (i, &byte) in text.as_bytes().iter().enumerate() {
    state = dfa.next_state(state, byte);
    if dfa.is_special_state(state) {
      if dfa.is_match_state(state) {
        ends.push(i);
      } else if dfa.is_dead_state(state) {
        return Some(on_char_boundaries(text, ends));
      } else if dfa.is_quit_state(state) {
        return None;
      }
    }
  }

  state = dfa.next_eoi_state(state);
  if dfa.is_match_state(state) {
    ends.push(text.len());
  }

  Some(on_char_boundaries(text, ends))
}

fn on_char_boundaries(text: &str, mut ends: Vec<usize>) -> Vec<usize> {
  ends.retain(|&end| text.is_char_boundary(end));
  ends
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn every_prefix_length() {
    let pattern = Pattern::new("a+").unwrap();
    assert_eq!(pattern.match_ends("aaab"), vec![1, 2, 3]);
    assert_eq!(pattern.match_ends("baaa"), Vec::<usize>::new());
    assert_eq!(pattern.match_ends(""), Vec::<usize>::new());
  }

  #[test]
  fn empty_prefix() {
    let pattern = Pattern::new("a*").unwrap();
    assert_eq!(pattern.match_ends("b"), vec![0]);
    assert_eq!(pattern.match_ends("aa"), vec![0, 1, 2]);
  }

  #[test]
  fn anchors_are_ignored() {
    let pattern = Pattern::new(r"^\s+$").unwrap();
    assert_eq!(pattern.match_ends("  x"), vec![1, 2]);
    assert!(pattern.is_match(" \n"));
    assert!(!pattern.is_match(" x"));
  }

  #[test]
  fn escaped_dollar_is_kept() {
    let pattern = Pattern::new(r"a\$").unwrap();
    assert_eq!(pattern.match_ends("a$$"), vec![2]);
  }

  #[test]
  fn case_insensitive_literal() {
    let pattern = Pattern::literal("a.b", true).unwrap();
    assert_eq!(pattern.match_ends("A.Bc"), vec![3]);
    assert_eq!(pattern.match_ends("axb"), Vec::<usize>::new());
  }

  #[test]
  fn multibyte_text() {
    let pattern = Pattern::new("ε|#").unwrap();
    assert_eq!(pattern.match_ends("ε x"), vec!["ε".len()]);

    let any = Pattern::new(".").unwrap();
    assert_eq!(any.match_ends("éa"), vec![2]);
  }

  #[test]
  fn dot_matches_new_line_option() {
    let plain = Pattern::new(".*").unwrap();
    let dotall = Pattern::with_options(".*", PatternOptions {
      dot_matches_new_line: true,
      ..PatternOptions::default()
    }).unwrap();

    assert_eq!(plain.match_ends("a\nb"), vec![0, 1]);
    assert_eq!(dotall.match_ends("a\nb"), vec![0, 1, 2, 3]);
  }

  #[test]
  fn word_boundaries() {
    let pattern = Pattern::new(r"\bfoo\b").unwrap();
    assert_eq!(pattern.match_ends("foo bar"), vec![3]);
    assert_eq!(pattern.match_ends("fo"), Vec::<usize>::new());
  }

  #[test]
  fn invalid_pattern() {
    let err = Pattern::new("(a").unwrap_err();
    assert_eq!(err.pattern, "(a");
  }
}
