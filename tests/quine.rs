use imp::Specification;
use pretty_assertions::assert_eq;
use sppf::longest_match_dead_branch_prune;

const BNF: &str = include_str!("fixtures/bnf.bnf");

fn is_literal(token: &str) -> bool {
  token.starts_with('\'') || token.starts_with('"')
}

#[test]
fn reads_its_own_description() {
  for spec in [
    Specification::from_bnf(BNF).unwrap(),
    Specification::from_bnf_classic(BNF).unwrap(),
  ] {
    assert_eq!(spec.rules().len(), 9);
    assert_eq!(spec.start_symbol(), "Spec");
    assert_eq!(spec.absorb().len(), 1);

    let (literals, named): (Vec<_>, Vec<_>) = spec.lexer().iter()
      .map(|(token, _)| token.to_string())
      .partition(|token| is_literal(token));
    assert_eq!(named.len(), 8);
    assert_eq!(literals, vec!["'::='", "'|'", "'#'"]);
  }
}

#[test]
fn both_readings_agree() {
  assert_eq!(
    Specification::from_bnf(BNF).unwrap(),
    Specification::from_bnf_classic(BNF).unwrap());
}

#[test]
fn parses_its_own_description_one_way() {
  let spec = Specification::from_bnf_classic(BNF).unwrap();
  let tree = spec.parse_classic(BNF).unwrap();
  assert_eq!(tree.symbol(), "Spec");
  assert_eq!(tree.lexeme(), BNF);

  let forest = spec.parse_with(BNF, &longest_match_dead_branch_prune).unwrap();
  assert_eq!(forest.symbol(), "Spec");
  assert_eq!(forest.trees(), vec![tree]);
}

#[test]
fn generated_grammar_reads_other_grammars() {
  let spec = Specification::from_bnf(BNF).unwrap();
  for text in [
    "A ::= 'a' A | ε\n",
    "start B\nA ::= 'a' B\nB ::= \"b\" | #\nws := \\s+\n",
    "strict\nabsorb ws\nS ::= x\nx := [0-9]+\nws := \\s+\n",
  ] {
    assert_eq!(spec.parse_classic(text).map(|tree| tree.symbol().to_owned()), Ok("Spec".to_owned()));
  }
}
