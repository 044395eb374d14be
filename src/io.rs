//! JSON snapshots of a built [`Specification`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use grammar::{Lexer, Name, Pattern, PatternOptions, Production, RuleItem, RuleSet};
use crate::{Specification, SpecError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationRecord {
  pub rules: Vec<RuleRecord>,
  pub lexer_patterns: IndexMap<String, PatternRecord>,
  pub absorb_patterns: Option<Vec<PatternRecord>>,
  pub start_rule: String,
}

/// One production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
  pub name: String,
  pub items: Vec<ItemRecord>,
}

/// A token (`value` unset for the empty symbol) or a non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
  pub terminal: bool,
  pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRecord {
  pub source: String,
  #[serde(default)]
  pub case_insensitive: bool,
  #[serde(default)]
  pub dot_matches_new_line: bool,
}

impl From<&Pattern> for PatternRecord {
  fn from(pattern: &Pattern) -> Self {
    let options = pattern.options();
    Self {
      source: pattern.source().to_owned(),
      case_insensitive: options.case_insensitive,
      dot_matches_new_line: options.dot_matches_new_line,
    }
  }
}

impl TryFrom<&PatternRecord> for Pattern {
  type Error = SpecError;

  fn try_from(record: &PatternRecord) -> Result<Self, SpecError> {
    Ok(Pattern::with_options(&record.source, PatternOptions {
      case_insensitive: record.case_insensitive,
      dot_matches_new_line: record.dot_matches_new_line,
    })?)
  }
}

impl From<&RuleItem> for ItemRecord {
  fn from(item: &RuleItem) -> Self {
    match item {
      RuleItem::Terminal(token) => Self {
        terminal: true,
        value: token.as_deref().map(str::to_owned),
      },
      RuleItem::NonTerminal(nt) => Self {
        terminal: false,
        value: Some(nt.to_string()),
      },
    }
  }
}

impl From<&ItemRecord> for RuleItem {
  fn from(record: &ItemRecord) -> Self {
    let value = record.value.as_deref().map(Name::from);
    match (record.terminal, value) {
      (false, Some(nt)) => RuleItem::NonTerminal(nt),
      (_, token) => RuleItem::Terminal(token),
    }
  }
}

impl From<&Specification> for SpecificationRecord {
  fn from(spec: &Specification) -> Self {
    let rules = spec.rules().productions()
      .map(|(_, prod)| RuleRecord {
        name: prod.nt.to_string(),
        items: prod.items.iter().map(ItemRecord::from).collect(),
      })
      .collect();
    let lexer_patterns = spec.lexer().iter()
      .map(|(token, pattern)| (token.to_string(), PatternRecord::from(pattern)))
      .collect();
    let absorb_patterns = Some(spec.absorb().iter().map(PatternRecord::from).collect());

    Self {
      rules,
      lexer_patterns,
      absorb_patterns,
      start_rule: spec.start_symbol().to_owned(),
    }
  }
}

impl TryFrom<&SpecificationRecord> for Specification {
  type Error = SpecError;

  fn try_from(record: &SpecificationRecord) -> Result<Self, SpecError> {
    let rules = RuleSet::new(record.rules.iter().map(|rule| Production {
      nt: rule.name.as_str().into(),
      items: rule.items.iter().map(RuleItem::from).collect(),
    }))?;

    let lexer = record.lexer_patterns.iter()
      .map(|(token, pattern)| {
        Pattern::try_from(pattern).map(|pattern| (Name::from(token.as_str()), pattern))
      })
      .collect::<Result<Lexer, SpecError>>()?;

    let absorb = record.absorb_patterns.iter()
      .flatten()
      .map(Pattern::try_from)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Specification::new(rules, lexer, absorb, record.start_rule.as_str()))
  }
}

impl Specification {
  pub fn to_json(&self) -> Result<String, SpecError> {
    Ok(serde_json::to_string_pretty(&SpecificationRecord::from(self))?)
  }

  pub fn from_json(text: &str) -> Result<Self, SpecError> {
    let record = serde_json::from_str::<SpecificationRecord>(text)?;
    Specification::try_from(&record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use insta::assert_snapshot;

  #[test]
  fn snapshot_layout() {
    let spec = Specification::from_bnf("strict\nA ::= 'a' A | ε").unwrap();
    assert_snapshot!(spec.to_json().unwrap(), @r###"
    {
      "rules": [
        {
          "name": "A",
          "items": [
            {
              "terminal": true,
              "value": "'a'"
            },
            {
              "terminal": false,
              "value": "A"
            }
          ]
        },
        {
          "name": "A",
          "items": []
        }
      ],
      "lexer_patterns": {
        "'a'": {
          "source": "a",
          "case_insensitive": false,
          "dot_matches_new_line": false
        }
      },
      "absorb_patterns": [],
      "start_rule": "A"
    }
    "###);
  }

  #[test]
  fn missing_absorb_list_reads_as_none() {
    let text = r#"{
      "rules": [{ "name": "S", "items": [{ "terminal": true, "value": "x" }] }],
      "lexer_patterns": { "x": { "source": "x+" } },
      "absorb_patterns": null,
      "start_rule": "S"
    }"#;
    let spec = Specification::from_json(text).unwrap();
    assert!(spec.absorb().is_empty());
    assert_eq!(spec.parse("xxx").unwrap().trees().len(), 1);
  }

  #[test]
  fn rejects_bad_patterns() {
    let text = r#"{
      "rules": [],
      "lexer_patterns": { "x": { "source": "(" } },
      "absorb_patterns": null,
      "start_rule": ""
    }"#;
    assert!(matches!(
      Specification::from_json(text),
      Err(SpecError::InvalidPattern(_))
    ));
  }
}
