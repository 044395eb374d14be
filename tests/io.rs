use imp::io::SpecificationRecord;
use imp::Specification;
use pretty_assertions::assert_eq;

const BNF: &str = include_str!("fixtures/bnf.bnf");

#[test]
fn snapshot_round_trip() {
  let spec = Specification::from_bnf(BNF).unwrap();
  let json = spec.to_json().unwrap();
  let restored = Specification::from_json(&json).unwrap();

  assert_eq!(restored, spec);
  assert_eq!(restored.to_json().unwrap(), json);
  assert_eq!(
    restored.parse_classic(BNF).unwrap(),
    spec.parse_classic(BNF).unwrap());
}

#[test]
fn record_mirrors_the_specification() {
  let spec = Specification::from_bnf("E ::= E \"and\" E | v\nv := [a-z]").unwrap();
  let record = SpecificationRecord::from(&spec);

  assert_eq!(record.start_rule, "E");
  assert_eq!(record.rules.len(), 2);
  assert_eq!(record.rules[0].items.len(), 3);
  assert!(record.rules[0].items[1].terminal);
  assert!(record.lexer_patterns["\"and\""].case_insensitive);
  assert!(record.lexer_patterns["v"].dot_matches_new_line);
  assert_eq!(record.absorb_patterns.as_ref().map(Vec::len), Some(1));

  let restored = Specification::try_from(&record).unwrap();
  assert_eq!(restored.parse("x AND y").unwrap().trees().len(), 1);
}
