use criterion::{criterion_group, criterion_main, Criterion};
use grammar::{Lexer, Name, Pattern, Production, RuleSet};
use sppf::{ParseOptions, Parser};

fn segmentations(rules: &RuleSet, lexer: &Lexer, input: &str) -> usize {
  let parser = Parser::new(rules, lexer);
  parser.parse("As", input, ParseOptions::default())
    .map_or(0, |forest| forest.trees().len())
}

fn expressions(rules: &RuleSet, lexer: &Lexer, input: &str) -> usize {
  let parser = Parser::new(rules, lexer);
  parser.parse("E", input, ParseOptions::default())
    .map_or(0, |forest| forest.len())
}

fn ambiguity_benchmark(c: &mut Criterion) {
  let runs = RuleSet::new(vec![
    Production::new("As").terminal("a").nonterminal("As"),
    Production::new("As").terminal("a"),
  ]).unwrap();
  let mut runs_lexer = Lexer::new();
  runs_lexer.insert(Name::from("a"), Pattern::new("a+").unwrap());
  let input = "a".repeat(15);

  c.bench_function("segmentations", |b| {
    b.iter(|| segmentations(&runs, &runs_lexer, &input))
  });

  let exprs = RuleSet::new(vec![
    Production::new("E").nonterminal("E").terminal("+").nonterminal("E"),
    Production::new("E").nonterminal("E").terminal("*").nonterminal("E"),
    Production::new("E").terminal("n"),
  ]).unwrap();
  let mut exprs_lexer = Lexer::new();
  exprs_lexer.insert(Name::from("+"), Pattern::new(r"\+").unwrap());
  exprs_lexer.insert(Name::from("*"), Pattern::new(r"\*").unwrap());
  exprs_lexer.insert(Name::from("n"), Pattern::new("n").unwrap());
  let input = vec!["n"; 40].join("+");

  c.bench_function("expression forest", |b| {
    b.iter(|| expressions(&exprs, &exprs_lexer, &input))
  });
}

criterion_group!{
  name = benches;
  config = Criterion::default().significance_level(0.1).sample_size(10);
  targets = ambiguity_benchmark
}
criterion_main!(benches);
