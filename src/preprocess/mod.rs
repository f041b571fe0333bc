//! Preprocessor Driver (§4.6).
//!
//! Orchestrates the card→statement pipeline: INCLUDE splicing, SET/JCLLIB
//! handling, job-admin filtering, PROC capture, EXEC expansion, and
//! in-stream payload capture. Emits a typed event stream (Design Notes §9)
//! rather than interleaving sentinel strings into the statement stream.

mod events;
mod include;
mod payload;

pub use events::PreprocEvent;

use tracing::{debug, warn};

use crate::card::{CardKind, normalize_card};
use crate::grammar::{self, Parm};
use crate::procexpand::{Procedure, ProcedureMap, parse_exec_overrides, parse_proc_defaults};
use crate::reassemble::Reassembler;
use crate::resolve::{LibraryResolver, apply_jcllib};
use crate::symbol::{SymbolTable, split_top_level};

use payload::{PayloadCapture, Terminator};

const JOB_ADMIN_OPS: &[&str] = &[
    "JOB", "CNTL", "ENDCNTL", "EXPORT", "NOTIFY", "OUTPUT", "SCHEDULE",
];
const CONDITIONAL_OPS: &[&str] = &["IF", "THEN", "ELSE", "ENDIF"];

/// One preprocessing pass over a single deck. Owns the process-local
/// mutable state described in §5: the symbol table, the procedure map, and
/// the active library-path list (mutated by `JCLLIB` for the rest of the
/// pass).
pub struct Preprocessor<'r> {
    symtab: SymbolTable,
    procs: ProcedureMap,
    libs: Vec<String>,
    resolver: &'r dyn LibraryResolver,
}

impl<'r> Preprocessor<'r> {
    pub fn new(libs: Vec<String>, resolver: &'r dyn LibraryResolver) -> Self {
        Self {
            symtab: SymbolTable::new(),
            procs: ProcedureMap::new(),
            libs,
            resolver,
        }
    }

    /// Preprocess raw card text (one deck, or a recursively-included
    /// member/procedure body) into a flat event stream.
    pub fn process_text(&mut self, text: &str) -> Vec<PreprocEvent> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        self.process_lines(&lines)
    }

    fn process_lines(&mut self, lines: &[String]) -> Vec<PreprocEvent> {
        let mut events = Vec::new();
        let mut reassembler = Reassembler::new();
        let mut payload: Option<PayloadCapture> = None;
        let mut capturing: Option<CapturingProc> = None;
        let mut idx = 0;

        while idx < lines.len() {
            let raw = &lines[idx];
            idx += 1;

            if let Some(cap) = payload.as_ref() {
                match cap.check(raw) {
                    Terminator::Consumed => {
                        payload = None;
                        continue;
                    }
                    Terminator::Reemit => {
                        payload = None;
                        idx -= 1;
                        continue;
                    }
                    Terminator::None => {
                        events.push(PreprocEvent::Payload(truncate_payload_line(raw)));
                        continue;
                    }
                }
            }

            let kind = normalize_card(raw, reassembler.is_continuing());
            let content = match kind {
                CardKind::Comment | CardKind::EndOfJob => continue,
                CardKind::Statement(s) | CardKind::Continuation(s) => s,
            };
            let Some(statement) = reassembler.push(&content) else {
                continue;
            };

            if let Some(cap) = capturing.as_mut() {
                if is_pend(&statement) {
                    let done = capturing.take().unwrap();
                    self.procs.insert(&done.name, Procedure {
                        header: done.header,
                        body: done.body,
                    });
                } else {
                    cap.body.push(statement);
                }
                continue;
            }

            if is_proc_start(&statement) {
                let (label, _op, _tail) = split_label_op_tail(&statement);
                let name = label.unwrap_or_default();
                capturing = Some(CapturingProc {
                    name,
                    header: statement,
                    body: Vec::new(),
                });
                continue;
            }

            let substituted = self.symtab.apply(&statement);
            self.dispatch(&substituted, &mut events, &mut payload);
        }

        events
    }

    fn dispatch(&mut self, statement: &str, events: &mut Vec<PreprocEvent>, payload: &mut Option<PayloadCapture>) {
        // Unlabeled statements retain a leading space from the card's `//
        // OPERATOR` form (label field empty); the grammar requires the
        // operator at column 0, so normalize it away here before any
        // downstream use of `statement`.
        let statement = statement.trim_start();
        let (label, op, tail) = split_label_op_tail(statement);
        let op_upper = op.to_ascii_uppercase();

        if JOB_ADMIN_OPS.contains(&op_upper.as_str()) || CONDITIONAL_OPS.contains(&op_upper.as_str())
        {
            return;
        }
        if op_upper == "JCLLIB" {
            self.handle_jcllib(&tail);
            return;
        }
        if op_upper == "SET" {
            self.symtab.apply_set_statement(&tail);
            return;
        }
        if op_upper == "INCLUDE" {
            self.handle_include(&tail, events);
            return;
        }
        if op_upper == "PEND" {
            // Unmatched PEND with no open capture; nothing to do.
            return;
        }
        if op_upper == "EXEC" {
            self.handle_exec(label, statement, events);
            return;
        }
        if op_upper == "DD" {
            self.handle_dd(statement, payload, events);
            return;
        }
        events.push(PreprocEvent::Card(statement.to_string()));
    }

    fn handle_jcllib(&mut self, tail: &str) {
        if let Some(list) = extract_paren_list(tail, "ORDER") {
            apply_jcllib(&mut self.libs, &list);
            debug!(roots = ?list, "applied JCLLIB");
        }
    }

    fn handle_include(&mut self, tail: &str, events: &mut Vec<PreprocEvent>) {
        let Some(member) = extract_kv(tail, "MEMBER") else {
            return;
        };
        match include::load_member(self.resolver, &member, &self.libs) {
            Ok(content) => {
                debug!(member, "resolved INCLUDE");
                events.extend(self.process_text(&content));
            }
            Err(e) => {
                warn!(member, error = %e, "INCLUDE member unreadable, treated as empty");
            }
        }
    }

    fn handle_exec(&mut self, label: Option<String>, statement: &str, events: &mut Vec<PreprocEvent>) {
        let card = match grammar::parse_statement(statement) {
            Ok(c) => c,
            Err(e) => {
                warn!(%statement, error = %e, "failed to parse EXEC card");
                return;
            }
        };

        let (target, override_tail) = match exec_target(&card, statement) {
            Some(t) => t,
            None => {
                events.push(PreprocEvent::Card(statement.to_string()));
                return;
            }
        };

        if card.params.contains_key("PGM") {
            events.push(PreprocEvent::Card(statement.to_string()));
            return;
        }

        if let Some(proc) = self.procs.get(&target).cloned() {
            self.expand(&target, label, &proc, &override_tail, events);
            return;
        }

        match include::load_member(self.resolver, &target, &self.libs) {
            Ok(content) => {
                let proc = parse_member_as_procedure(&content);
                debug!(proc = %target, "resolved procedure from library");
                self.expand(&target, label, &proc, &override_tail, events);
            }
            Err(_) => {
                events.push(PreprocEvent::Card(statement.to_string()));
            }
        }
    }

    fn expand(
        &mut self,
        proc_name: &str,
        caller_label: Option<String>,
        proc: &Procedure,
        override_tail: &str,
        events: &mut Vec<PreprocEvent>,
    ) {
        self.symtab.push_scope();
        let (_, _, header_tail) = split_label_op_tail(&proc.header);
        for (k, v) in parse_proc_defaults(&header_tail) {
            self.symtab.set(&k, &v);
        }
        for (k, v) in parse_exec_overrides(override_tail) {
            self.symtab.set(&k, &v);
        }

        events.push(PreprocEvent::ProcStart {
            caller_label,
            proc_name: proc_name.to_string(),
        });
        let body_events = self.process_lines(&proc.body);
        events.extend(body_events);
        events.push(PreprocEvent::ProcEnd);

        self.symtab.pop_scope();
    }

    fn handle_dd(&mut self, statement: &str, payload: &mut Option<PayloadCapture>, events: &mut Vec<PreprocEvent>) {
        events.push(PreprocEvent::Card(statement.to_string()));
        if let Ok(card) = grammar::parse_statement(statement) {
            let is_star_or_data = card
                .positional
                .as_deref()
                .map(|p| p == "*" || p.eq_ignore_ascii_case("DATA"))
                .unwrap_or(false);
            if is_star_or_data {
                let dlm = card.params.get("DLM").and_then(Parm::as_value).map(str::to_string);
                *payload = Some(PayloadCapture::new(dlm));
            }
        }
    }
}

struct CapturingProc {
    name: String,
    header: String,
    body: Vec<String>,
}

/// Split a statement into `(label, operator, operand_tail)`. A label is
/// present unless the first token is itself a recognized operator keyword
/// (unlabeled `DD`/`EXEC` cards, and control statements that never carry a
/// label).
fn split_label_op_tail(statement: &str) -> (Option<String>, String, String) {
    let trimmed = statement.trim_start();
    let (first, rest) = match trimmed.split_once(' ') {
        Some((a, b)) => (a.to_string(), b.trim_start()),
        None => (trimmed.to_string(), ""),
    };

    if is_known_operator(&first) {
        return (None, first, rest.to_string());
    }
    if rest.is_empty() {
        return (Some(first), String::new(), String::new());
    }
    match rest.split_once(' ') {
        Some((op, tail)) => (Some(first), op.to_string(), tail.trim_start().to_string()),
        None => (Some(first), rest.to_string(), String::new()),
    }
}

fn is_known_operator(token: &str) -> bool {
    const OPS: &[&str] = &[
        "EXEC", "DD", "JOB", "CNTL", "ENDCNTL", "EXPORT", "NOTIFY", "OUTPUT", "SCHEDULE",
        "JCLLIB", "SET", "IF", "THEN", "ELSE", "ENDIF", "PROC", "PEND", "INCLUDE",
    ];
    OPS.iter().any(|o| token.eq_ignore_ascii_case(o))
}

fn is_proc_start(statement: &str) -> bool {
    let (_, op, _) = split_label_op_tail(statement);
    op.eq_ignore_ascii_case("PROC")
}

fn is_pend(statement: &str) -> bool {
    let (_, op, _) = split_label_op_tail(statement);
    op.eq_ignore_ascii_case("PEND")
}

/// Determine the EXEC's invocation target name and the override operand
/// tail used for procedure-parameter binding (§4.5 step 3).
fn exec_target(card: &grammar::ParsedCard, statement: &str) -> Option<(String, String)> {
    if let Some(proc) = card.params.get("PROC").and_then(Parm::as_value) {
        let (_, _, tail) = split_label_op_tail(statement);
        let override_tail = strip_first_keyword(&tail, "PROC", proc);
        return Some((proc.to_string(), override_tail));
    }
    if let Some(positional) = &card.positional {
        let (_, _, tail) = split_label_op_tail(statement);
        let override_tail = strip_leading_positional(&tail, positional);
        return Some((positional.to_string(), override_tail));
    }
    None
}

fn strip_first_keyword(tail: &str, key: &str, value: &str) -> String {
    let needle = format!("{key}={value}");
    match tail.find(&needle) {
        Some(pos) => {
            let after = pos + needle.len();
            tail[after..].trim_start_matches(',').to_string()
        }
        None => tail.to_string(),
    }
}

fn strip_leading_positional(tail: &str, positional: &str) -> String {
    match tail.strip_prefix(positional) {
        Some(rest) => rest.trim_start_matches(',').to_string(),
        None => tail.to_string(),
    }
}

/// Extract `KEY=(a,b,c)` from an operand tail, returning the inner items.
fn extract_paren_list(tail: &str, key: &str) -> Option<Vec<String>> {
    for part in split_top_level(tail, ',') {
        if let Some((k, v)) = part.split_once('=') {
            if k.trim().eq_ignore_ascii_case(key) {
                let v = v.trim();
                if v.starts_with('(') && v.ends_with(')') {
                    return Some(
                        split_top_level(&v[1..v.len() - 1], ',')
                            .into_iter()
                            .map(|s| s.trim().to_string())
                            .collect(),
                    );
                }
                return Some(vec![v.to_string()]);
            }
        }
    }
    None
}

fn extract_kv(tail: &str, key: &str) -> Option<String> {
    for part in split_top_level(tail, ',') {
        if let Some((k, v)) = part.split_once('=') {
            if k.trim().eq_ignore_ascii_case(key) {
                return Some(v.trim().trim_matches('\'').to_string());
            }
        }
    }
    None
}

fn truncate_payload_line(raw: &str) -> String {
    match raw.char_indices().nth(crate::base::constants::CARD_COLUMN_LIMIT) {
        Some((idx, _)) => raw[..idx].to_string(),
        None => raw.to_string(),
    }
}

/// Parse a library member's content as a procedure: the header is its
/// first statement (expected to contain `PROC`), the body is every
/// subsequent raw line up to a matching `PEND` (or end of file if none is
/// present).
fn parse_member_as_procedure(content: &str) -> Procedure {
    let mut lines = content.lines();
    let mut header = String::new();
    let mut body = Vec::new();
    let mut reassembler = Reassembler::new();

    for raw in lines.by_ref() {
        let kind = normalize_card(raw, reassembler.is_continuing());
        let content = match kind {
            CardKind::Comment | CardKind::EndOfJob => continue,
            CardKind::Statement(s) | CardKind::Continuation(s) => s,
        };
        if let Some(statement) = reassembler.push(&content) {
            header = statement;
            break;
        }
    }
    for raw in lines {
        if is_pend(raw) {
            break;
        }
        body.push(raw.to_string());
    }

    Procedure { header, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::FilesystemResolver;

    fn events_of(text: &str) -> Vec<PreprocEvent> {
        let resolver = FilesystemResolver { ext: None };
        let mut pp = Preprocessor::new(vec![], &resolver);
        pp.process_text(text)
    }

    #[test]
    fn pgm_step_emitted_unchanged() {
        let ev = events_of("//STEP1 EXEC PGM=IEFBR14");
        assert_eq!(ev, vec![PreprocEvent::Card("STEP1 EXEC PGM=IEFBR14".to_string())]);
    }

    #[test]
    fn set_statement_applies_before_emission() {
        let ev = events_of("// SET P=FOO\n//S1 EXEC PGM=&P");
        assert_eq!(ev, vec![PreprocEvent::Card("S1 EXEC PGM=FOO".to_string())]);
    }

    #[test]
    fn in_stream_procedure_expansion() {
        let text = "\
//MYPROC PROC P=FOO
//S1 EXEC PGM=&P
// PEND
//CALL EXEC MYPROC,P=BAR";
        let ev = events_of(text);
        assert_eq!(
            ev,
            vec![
                PreprocEvent::ProcStart {
                    caller_label: Some("CALL".to_string()),
                    proc_name: "MYPROC".to_string()
                },
                PreprocEvent::Card("S1 EXEC PGM=BAR".to_string()),
                PreprocEvent::ProcEnd,
            ]
        );
    }

    #[test]
    fn instream_payload_default_terminator() {
        let text = "\
//STEP EXEC PGM=X
//SYSIN DD *
HELLO
WORLD
//NEXT DD DUMMY";
        let ev = events_of(text);
        assert_eq!(
            ev,
            vec![
                PreprocEvent::Card("STEP EXEC PGM=X".to_string()),
                PreprocEvent::Card("SYSIN DD *".to_string()),
                PreprocEvent::Payload("HELLO".to_string()),
                PreprocEvent::Payload("WORLD".to_string()),
                PreprocEvent::Card("NEXT DD DUMMY".to_string()),
            ]
        );
    }

    #[test]
    fn instream_payload_custom_delimiter_consumed() {
        let text = "\
//STEP EXEC PGM=X
//SYSIN DD *,DLM=$$
HELLO
$$
//NEXT DD DUMMY";
        let ev = events_of(text);
        assert_eq!(
            ev,
            vec![
                PreprocEvent::Card("STEP EXEC PGM=X".to_string()),
                PreprocEvent::Card("SYSIN DD *,DLM=$$".to_string()),
                PreprocEvent::Payload("HELLO".to_string()),
                PreprocEvent::Card("NEXT DD DUMMY".to_string()),
            ]
        );
    }
}
