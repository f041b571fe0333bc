//! Step Assembler (§4.8).
//!
//! Consumes the preprocessor's event stream, maintaining a procedure
//! context stack and a current-step pointer, and builds the ordered step
//! list. Parse failures on individual cards are logged and skipped; they
//! never abort the pass (§7).

use indexmap::IndexMap;
use tracing::warn;

use crate::grammar::{self, Parm, ParsedCard, StmtKind};
use crate::preprocess::PreprocEvent;

/// One EXEC invocation and its trailing DD allocations (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub step_name: String,
    pub proc_step_name: Option<String>,
    pub proc_name: Option<String>,
    pub program_name: Option<String>,
    pub params: IndexMap<String, Parm>,
    pub dds: Vec<Dd>,
}

/// A single DD card bound to the step it was appended to.
///
/// `label` is `None` exactly when this is a concatenation continuation of
/// the previous labeled DD (§3); resolving the effective `dd_name` and
/// `allocation_offset` for persistence is the Persistence Adapter's job
/// (§6), not the assembler's — this struct stays a thin wrapper over what
/// the grammar already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dd {
    pub label: Option<String>,
    pub positional: Option<String>,
    pub params: IndexMap<String, Parm>,
    pub payload: Vec<String>,
}

struct ProcFrame {
    caller_label: Option<String>,
    proc_name: String,
}

/// Assembles a flat [`PreprocEvent`] stream into an ordered step list.
#[derive(Default)]
pub struct Assembler {
    stack: Vec<ProcFrame>,
    steps: Vec<Step>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assemble(events: &[PreprocEvent]) -> Vec<Step> {
        let mut assembler = Self::new();
        for event in events {
            assembler.handle(event);
        }
        assembler.steps
    }

    fn handle(&mut self, event: &PreprocEvent) {
        match event {
            PreprocEvent::ProcStart { caller_label, proc_name } => {
                self.stack.push(ProcFrame {
                    caller_label: caller_label.clone(),
                    proc_name: proc_name.clone(),
                });
            }
            PreprocEvent::ProcEnd => {
                self.stack.pop();
            }
            PreprocEvent::Payload(line) => {
                if let Some(dd) = self.steps.last_mut().and_then(|s| s.dds.last_mut()) {
                    dd.payload.push(line.clone());
                }
            }
            PreprocEvent::Card(text) => match grammar::parse_statement(text) {
                Ok(card) => self.handle_card(card),
                Err(e) => warn!(statement = %text, error = %e, "dropping unparsable card"),
            },
        }
    }

    fn handle_card(&mut self, card: ParsedCard) {
        match card.kind {
            StmtKind::Exec => self.start_step(card),
            StmtKind::Dd => self.append_dd(card),
        }
    }

    fn start_step(&mut self, card: ParsedCard) {
        let (step_name, proc_step_name, proc_name) = if let Some(frame) = self.stack.last() {
            (
                frame.caller_label.clone().unwrap_or_default(),
                card.label.clone(),
                Some(frame.proc_name.clone()),
            )
        } else {
            let proc_name = card.params.get("PROC").and_then(Parm::as_value).map(String::from);
            (card.label.clone().unwrap_or_default(), None, proc_name)
        };
        let program_name = card.params.get("PGM").and_then(Parm::as_value).map(String::from);

        self.steps.push(Step {
            step_name,
            proc_step_name,
            proc_name,
            program_name,
            params: card.params,
            dds: Vec::new(),
        });
    }

    fn append_dd(&mut self, card: ParsedCard) {
        let Some(step) = self.steps.last_mut() else {
            warn!("DD card with no preceding EXEC, dropping");
            return;
        };
        step.dds.push(Dd {
            label: card.label,
            positional: card.positional,
            params: card.params,
            payload: Vec::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev_card(s: &str) -> PreprocEvent {
        PreprocEvent::Card(s.to_string())
    }

    #[test]
    fn s1_pgm_step_has_no_dds() {
        let steps = Assembler::assemble(&[ev_card("STEP1 EXEC PGM=IEFBR14")]);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_name, "STEP1");
        assert_eq!(steps[0].program_name.as_deref(), Some("IEFBR14"));
        assert_eq!(steps[0].proc_step_name, None);
        assert_eq!(steps[0].proc_name, None);
        assert!(steps[0].dds.is_empty());
    }

    #[test]
    fn s2_dd_appends_to_current_step() {
        let steps = Assembler::assemble(&[
            ev_card("STEP2 EXEC PGM=X"),
            ev_card("OUT DD DSN=A.B,DISP=(NEW,CATLG,DELETE)"),
        ]);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].dds.len(), 1);
        assert_eq!(steps[0].dds[0].label.as_deref(), Some("OUT"));
    }

    #[test]
    fn s3_proc_expansion_resolves_display_names() {
        let steps = Assembler::assemble(&[
            PreprocEvent::ProcStart {
                caller_label: Some("CALL".to_string()),
                proc_name: "MYPROC".to_string(),
            },
            ev_card("S1 EXEC PGM=BAR"),
            PreprocEvent::ProcEnd,
        ]);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_name, "CALL");
        assert_eq!(steps[0].proc_name.as_deref(), Some("MYPROC"));
        assert_eq!(steps[0].proc_step_name.as_deref(), Some("S1"));
        assert_eq!(steps[0].program_name.as_deref(), Some("BAR"));
    }

    #[test]
    fn s4_payload_attaches_to_most_recent_dd() {
        let steps = Assembler::assemble(&[
            ev_card("STEP EXEC PGM=X"),
            ev_card("SYSIN DD *"),
            PreprocEvent::Payload("HELLO".to_string()),
            PreprocEvent::Payload("WORLD".to_string()),
            ev_card("NEXT DD DUMMY"),
        ]);
        assert_eq!(steps[0].dds.len(), 2);
        assert_eq!(steps[0].dds[0].payload, vec!["HELLO", "WORLD"]);
        assert!(steps[0].dds[1].payload.is_empty());
    }

    #[test]
    fn s5_unlabeled_dds_preserve_concatenation_order() {
        let steps = Assembler::assemble(&[
            ev_card("STEP EXEC PGM=X"),
            ev_card("IN DD DSN=A"),
            ev_card("DD DSN=B"),
            ev_card("DD DSN=C"),
        ]);
        assert_eq!(steps[0].dds.len(), 3);
        assert_eq!(steps[0].dds[0].label.as_deref(), Some("IN"));
        assert_eq!(steps[0].dds[1].label, None);
        assert_eq!(steps[0].dds[2].label, None);
    }

    #[test]
    fn unparsable_card_is_dropped_not_fatal() {
        let steps = Assembler::assemble(&[
            ev_card("STEP EXEC PGM=X"),
            ev_card("THIS IS NOT VALID JCL @@@"),
            ev_card("OUT DD DSN=A"),
        ]);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].dds.len(), 1);
    }

    #[test]
    fn dd_with_no_current_step_is_dropped() {
        let steps = Assembler::assemble(&[ev_card("OUT DD DSN=A")]);
        assert!(steps.is_empty());
    }
}
