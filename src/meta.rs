use once_cell::sync::Lazy;
use grammar::{Lexer, Name, Pattern, PatternOptions, Production, RuleSet};

pub(crate) const START: &str = "Spec";

/// The grammar of grammar descriptions.
pub(crate) struct Meta {
  pub rules: RuleSet,
  pub lexer: Lexer,
  pub absorb: Vec<Pattern>,
}

pub(crate) static META: Lazy<Meta> = Lazy::new(|| {
  log::debug!("building the grammar description grammar");
  Meta {
    rules: rules(),
    lexer: lexer(),
    absorb: vec![
      pattern(r"\s+", false),
      pattern(r"//[^\n]*\n", false),
    ],
  }
});

fn rules() -> RuleSet {
  let sequence_start = |nt: &str| {
    vec![
      Production::new(nt).terminal("casedLiteral").nonterminal("AltTail"),
      Production::new(nt).terminal("uncasedLiteral").nonterminal("AltTail"),
      Production::new(nt).terminal("id").nonterminal("AltTail"),
    ]
  };

  let mut prods = vec![
    Production::new("Spec"),
    Production::new("Spec").nonterminal("Directive").nonterminal("Spec"),
    Production::new("Spec").nonterminal("Rules"),

    Production::new("Rules").nonterminal("ParseRule"),
    Production::new("Rules").nonterminal("ParseRule").nonterminal("Rules"),
    Production::new("Rules").nonterminal("LexRule"),
    Production::new("Rules").nonterminal("LexRule").nonterminal("Rules"),

    Production::new("Directive").terminal("start").terminal("id"),
    Production::new("Directive").terminal("strict"),
    Production::new("Directive").terminal("absorb").nonterminal("AltTail"),

    Production::new("ParseRule")
      .terminal("id")
      .terminal("'::='")
      .nonterminal("Alternates"),

    Production::new("Alternates").nonterminal("Alternate"),
    Production::new("Alternates")
      .nonterminal("Alternate")
      .terminal("'|'")
      .nonterminal("Alternates"),

    Production::new("Alternate").terminal("eps"),
  ];
  prods.extend(sequence_start("Alternate"));
  prods.extend(sequence_start("AltTail"));
  prods.push(Production::new("AltTail"));
  prods.push(Production::new("LexRule").terminal("id").terminal("regex"));

  RuleSet::new(prods).expect("grammar description rules are closed")
}

fn lexer() -> Lexer {
  [
    ("'::='", "::=", false),
    ("'|'", r"\|", false),
    ("eps", "ε|#", false),
    ("start", "start", true),
    ("strict", "strict", true),
    ("absorb", "absorb", true),
    ("casedLiteral", r"'([^']|\\')*'", false),
    ("uncasedLiteral", r#""([^"]|\\")*""#, false),
    ("id", r#"([^'"\|\sε#:=]|:[^:=])+"#, false),
    ("regex", r":=[^\n]*\n", false),
  ].iter()
    .map(|&(token, source, case_insensitive)| {
      (Name::from(token), pattern(source, case_insensitive))
    })
    .collect()
}

fn pattern(source: &str, case_insensitive: bool) -> Pattern {
  Pattern::with_options(source, PatternOptions {
    case_insensitive,
    dot_matches_new_line: false,
  }).expect("grammar description tokens are valid patterns")
}

#[cfg(test)]
mod tests {
  use super::*;
  use grammar::LexMode;
  use sppf::{ParseOptions, Parser};

  #[test]
  fn describes_itself_unambiguously() {
    let parser = Parser::new(&META.rules, &META.lexer);
    let input = "start A\nA ::= 'a' A | ε\nB := b+\n";
    let forest = parser.try_parse(START, input, ParseOptions {
      absorb: &META.absorb,
      chooser: None,
      mode: LexMode::Classic,
    }).unwrap();
    assert_eq!(forest.trees().len(), 1);
  }

  #[test]
  fn keywords_ignore_case() {
    let lattice = META.lexer.lex("STRICT", &[], LexMode::Ambiguous).unwrap();
    let mut tokens = lattice.iter()
      .filter(|twe| twe.span.len() == 6)
      .map(|twe| twe.token.to_string())
      .collect::<Vec<_>>();
    tokens.sort();
    assert_eq!(tokens, vec!["id", "strict"]);

    let lattice = META.lexer.lex("STRICT", &[], LexMode::Classic).unwrap();
    let tokens = lattice.iter()
      .map(|twe| twe.token.to_string())
      .collect::<Vec<_>>();
    assert_eq!(tokens, vec!["strict"]);
  }
}
