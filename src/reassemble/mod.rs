//! Statement Reassembler (§4.3).
//!
//! Joins continuation cards (trailing-comma rule) into logical statements.

/// Joins normalized card operand contributions into complete statements.
///
/// A statement is complete when the most recently appended content does not
/// end with a trailing comma (ignoring trailing whitespace, which does not
/// occur here since [`crate::card::normalize_card`] already truncated
/// columns and stripped comments).
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: String,
    continuing: bool,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a header card has been pushed and a continuation is
    /// expected (i.e. the caller's next card should be normalized with
    /// `is_continuation = true`).
    pub fn is_continuing(&self) -> bool {
        self.continuing
    }

    /// Append one card's operand contribution. Returns `Some(statement)`
    /// when this card completes the logical statement.
    pub fn push(&mut self, content: &str) -> Option<String> {
        self.buffer.push_str(content);

        if content.trim_end().ends_with(',') {
            self.continuing = true;
            None
        } else {
            self.continuing = false;
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardKind, normalize_card};

    fn push_raw(r: &mut Reassembler, raw: &str) -> Option<String> {
        let kind = normalize_card(raw, r.is_continuing());
        match kind {
            CardKind::Statement(s) | CardKind::Continuation(s) => r.push(&s),
            CardKind::Comment | CardKind::EndOfJob => None,
        }
    }

    #[test]
    fn single_card_statement_completes_immediately() {
        let mut r = Reassembler::new();
        let stmt = push_raw(&mut r, "//STEP1 EXEC PGM=IEFBR14");
        assert_eq!(stmt, Some("STEP1 EXEC PGM=IEFBR14".to_string()));
        assert!(!r.is_continuing());
    }

    #[test]
    fn continuation_closure_joins_without_extra_spaces() {
        // Invariant 3 (§8).
        let mut r = Reassembler::new();
        assert_eq!(push_raw(&mut r, "//OUT DD DSN=A.B,"), None);
        assert!(r.is_continuing());
        let stmt = push_raw(&mut r, "//          DISP=(NEW,CATLG,DELETE)");
        assert_eq!(stmt, Some("OUT DD DSN=A.B,DISP=(NEW,CATLG,DELETE)".to_string()));
    }

    #[test]
    fn multiple_continuations_chain() {
        let mut r = Reassembler::new();
        assert_eq!(push_raw(&mut r, "//X EXEC PGM=Y,"), None);
        assert_eq!(push_raw(&mut r, "//   PARM='A',"), None);
        let stmt = push_raw(&mut r, "//   REGION=4M");
        assert_eq!(stmt, Some("X EXEC PGM=Y,PARM='A',REGION=4M".to_string()));
    }
}
