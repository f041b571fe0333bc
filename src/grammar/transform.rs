//! Grammar + Transformer (§4.7).
//!
//! Parses one statement with the pest grammar and folds the resulting
//! parse tree into a single-key [`ParsedCard`], the way
//! [`crate::grammar`]'s sibling AST-construction modules in this codebase
//! fold a `Pairs` traversal into one struct per production.

use indexmap::IndexMap;
use pest::Parser;
use pest::iterators::Pair;
use thiserror::Error;

use super::params::{DcbBlock, Parm};
use super::parser::{JclParser, Rule};
use crate::symbol::split_top_level;

/// Whether a parsed statement is an EXEC or a DD card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtKind {
    Exec,
    Dd,
}

/// `{type: EXEC|DD, label?: string, params: mapping}` (§4.7).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCard {
    pub kind: StmtKind,
    pub label: Option<String>,
    /// The leading positional token, when present: a procedure/program name
    /// on an EXEC, or `*`/`DATA`/`DUMMY` on a DD.
    pub positional: Option<String>,
    pub params: IndexMap<String, Parm>,
}

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("failed to parse statement {0:?}: {1}")]
    Parse(String, String),
}

/// Parse one preprocessed statement into a [`ParsedCard`].
pub fn parse_statement(statement: &str) -> Result<ParsedCard, GrammarError> {
    let mut pairs = JclParser::parse(Rule::statement, statement)
        .map_err(|e| GrammarError::Parse(statement.to_string(), e.to_string()))?;

    let statement_pair = pairs.next().expect("statement rule always produces one pair");
    let head = statement_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::head)
        .expect("statement always contains head");

    let mut label = None;
    let mut stmt_pair = None;
    for inner in head.into_inner() {
        match inner.as_rule() {
            Rule::label => label = Some(inner.as_str().to_string()),
            Rule::exec_stmt | Rule::dd_stmt => stmt_pair = Some(inner),
            _ => {}
        }
    }
    let stmt_pair = stmt_pair.expect("head always contains exec_stmt or dd_stmt");
    let kind = match stmt_pair.as_rule() {
        Rule::exec_stmt => StmtKind::Exec,
        Rule::dd_stmt => StmtKind::Dd,
        _ => unreachable!(),
    };

    let mut positional = None;
    let mut params = IndexMap::new();
    let mut first_item = true;

    if let Some(body) = stmt_pair.into_inner().find(|p| p.as_rule() == Rule::body) {
        for item in body.into_inner() {
            debug_assert_eq!(item.as_rule(), Rule::item);
            let inner = item.into_inner().next().expect("item has one child");
            match inner.as_rule() {
                Rule::kv_param => {
                    let (key, value_pair) = split_kv(inner);
                    insert_param(&mut params, &key, value_pair);
                }
                Rule::value if first_item => {
                    positional = Some(value_text(inner));
                }
                Rule::value => {
                    // Malformed/unexpected extra bare token; preserve it
                    // rather than silently discarding positional data.
                    let text = value_text(inner);
                    match params.get_mut("_EXTRA") {
                        Some(Parm::List(list)) => list.push(text),
                        _ => {
                            params.insert("_EXTRA".to_string(), Parm::List(vec![text]));
                        }
                    }
                }
                _ => unreachable!(),
            }
            first_item = false;
        }
    }

    Ok(ParsedCard {
        kind,
        label,
        positional,
        params,
    })
}

fn split_kv(kv: Pair<Rule>) -> (String, Pair<Rule>) {
    let mut key = None;
    let mut value = None;
    for p in kv.into_inner() {
        match p.as_rule() {
            Rule::key => key = Some(p.as_str().to_ascii_uppercase()),
            Rule::value => value = Some(p),
            _ => {}
        }
    }
    (key.expect("kv_param has key"), value.expect("kv_param has value"))
}

fn insert_param(params: &mut IndexMap<String, Parm>, key: &str, value: Pair<Rule>) {
    let parm = match key {
        "DISP" => Parm::Disp(parse_disp(value)),
        "DCB" => parse_dcb(value),
        "VOL" => Parm::List(parse_vol_ser(value)),
        "SPACE" => Parm::Value(value.as_str().to_string()),
        _ => parse_generic(value),
    };
    params.insert(key.to_string(), parm);
}

/// Extract the plain text of a `value` node's single child, unquoting
/// quoted literals (including doubled embedded quotes).
fn value_text(value: Pair<Rule>) -> String {
    let inner = value.into_inner().next().expect("value has one child");
    match inner.as_rule() {
        Rule::quoted => unquote(inner.as_str()),
        Rule::bare_value => inner.as_str().to_string(),
        Rule::paren_list => inner.as_str().to_string(),
        _ => unreachable!(),
    }
}

fn unquote(text: &str) -> String {
    let stripped = &text[1..text.len() - 1];
    stripped.replace("''", "'")
}

fn parse_generic(value: Pair<Rule>) -> Parm {
    let inner = value.into_inner().next().expect("value has one child");
    match inner.as_rule() {
        Rule::paren_list => Parm::List(collect_list_text(inner)),
        Rule::quoted => Parm::Value(unquote(inner.as_str())),
        Rule::bare_value => Parm::Value(inner.as_str().to_string()),
        _ => unreachable!(),
    }
}

fn collect_list_text(paren_list: Pair<Rule>) -> Vec<String> {
    paren_list
        .into_inner()
        .filter_map(|opt_item| {
            opt_item
                .into_inner()
                .next()
                .and_then(|item| item.into_inner().next())
                .map(text_of_item_child)
        })
        .collect()
}

fn text_of_item_child(child: Pair<Rule>) -> String {
    match child.as_rule() {
        Rule::kv_param => child.as_str().to_string(),
        Rule::value => value_text(child),
        _ => child.as_str().to_string(),
    }
}

/// `DISP=VAL | (VAL[,VAL[,VAL]])`, omitted positions preserved as absent.
fn parse_disp(value: Pair<Rule>) -> Vec<Option<String>> {
    let inner = value.into_inner().next().expect("value has one child");
    match inner.as_rule() {
        Rule::paren_list => inner
            .into_inner()
            .map(|opt_item| {
                opt_item
                    .into_inner()
                    .next()
                    .and_then(|item| item.into_inner().next())
                    .map(text_of_item_child)
            })
            .collect(),
        Rule::quoted => vec![Some(unquote(inner.as_str()))],
        Rule::bare_value => vec![Some(inner.as_str().to_string())],
        _ => unreachable!(),
    }
}

/// `DCB=value | (sublist)`.
fn parse_dcb(value: Pair<Rule>) -> Parm {
    let inner = value.into_inner().next().expect("value has one child");
    match inner.as_rule() {
        Rule::paren_list => {
            let mut dcb = DcbBlock::default();
            let mut position = 0usize;
            for opt_item in inner.into_inner() {
                let raw = opt_item.as_str().trim();
                let Some(item) = opt_item.into_inner().next() else {
                    continue;
                };
                position += 1;
                let Some(child) = item.into_inner().next() else {
                    dcb.others.insert(format!("_{position}"), raw.to_string());
                    continue;
                };
                if child.as_rule() != Rule::kv_param {
                    // A bare positional/symbolic override token (e.g. a DCB
                    // model name) rather than a KEY=VALUE pair; preserve it
                    // verbatim under a positional key.
                    dcb.others.insert(format!("_{position}"), raw.to_string());
                    continue;
                }
                let (k, v) = split_kv(child);
                let text = value_text(v);
                match k.as_str() {
                    "LRECL" => dcb.lrecl = Some(text),
                    "RECFM" => dcb.recfm = Some(text),
                    "BLKSIZE" => dcb.blksize = Some(text),
                    "DSORG" => dcb.dsorg = Some(text),
                    other => {
                        dcb.others.insert(other.to_string(), text);
                    }
                }
            }
            Parm::Dcb(dcb)
        }
        Rule::quoted => Parm::Value(unquote(inner.as_str())),
        Rule::bare_value => Parm::Value(inner.as_str().to_string()),
        _ => unreachable!(),
    }
}

/// `VOL=SER=(value|list)`.
fn parse_vol_ser(value: Pair<Rule>) -> Vec<String> {
    let text = value_text(value.clone());
    let without_prefix = text
        .strip_prefix("SER=")
        .or_else(|| {
            let upper_len = "SER=".len();
            if text.len() >= upper_len && text[..upper_len].eq_ignore_ascii_case("SER=") {
                Some(&text[upper_len..])
            } else {
                None
            }
        })
        .unwrap_or(text.as_str());

    if without_prefix.starts_with('(') && without_prefix.ends_with(')') {
        split_top_level(&without_prefix[1..without_prefix.len() - 1], ',')
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        vec![without_prefix.to_string()]
    }
}
