//! Card Normalizer (§4.2).
//!
//! Cleans one physical card: truncates to the significant column range,
//! drops comment/end-of-deck cards, and strips trailing in-line comments
//! while respecting quoted literals.

use crate::base::constants::CARD_COLUMN_LIMIT;

/// The outcome of normalizing a single physical card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardKind {
    /// `//*` comment, dropped entirely.
    Comment,
    /// Bare `//` end-of-job marker, dropped entirely.
    EndOfJob,
    /// A continuation card: operand content only, no label/operator.
    Continuation(String),
    /// A statement-opening card: `//label? operator operands`.
    Statement(String),
}

/// Truncate to [`CARD_COLUMN_LIMIT`] columns and classify a raw physical
/// card. `is_continuation` is set by the [`Reassembler`](crate::reassemble)
/// when this card is being re-read as a trailing-comma continuation, in
/// which case the entire post-`//` content is operand text.
pub fn normalize_card(raw: &str, is_continuation: bool) -> CardKind {
    let truncated: &str = match raw.char_indices().nth(CARD_COLUMN_LIMIT) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    };

    if truncated.starts_with("//*") || truncated.starts_with("/*") {
        return CardKind::Comment;
    }
    if truncated == "//" {
        return CardKind::EndOfJob;
    }

    let content = truncated.strip_prefix("//").unwrap_or(truncated);

    if is_continuation {
        let trimmed = content.trim_start_matches(' ');
        return CardKind::Continuation(strip_inline_comment(trimmed, true));
    }
    CardKind::Statement(strip_inline_comment(content, false))
}

/// Strip a trailing in-line comment from a card's post-`//` content.
///
/// For a header card (`is_continuation == false`) the comment boundary is
/// only recognized after the operator and at least one whitespace
/// separator; for a continuation card the entire content is operand text,
/// so the scan starts at offset 0. Within the operand field, the first
/// unquoted space starts the comment; single quotes toggle an in-quote
/// state that suppresses space-as-terminator.
pub fn strip_inline_comment(content: &str, is_continuation: bool) -> String {
    let scan_from = if is_continuation {
        0
    } else {
        operand_field_start(content)
    };

    let (head, operand) = content.split_at(scan_from);
    let mut in_quotes = false;
    let mut cut = operand.len();
    for (idx, ch) in operand.char_indices() {
        match ch {
            '\'' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                cut = idx;
                break;
            }
            _ => {}
        }
    }
    let mut out = String::with_capacity(head.len() + cut);
    out.push_str(head);
    out.push_str(&operand[..cut]);
    out
}

/// Find the byte offset where the operand field begins: past the operator
/// keyword and its following run of whitespace. A label, if present,
/// precedes the operator with no intervening space.
fn operand_field_start(content: &str) -> usize {
    let after_label = content.find(' ').map(|i| i + 1).unwrap_or(content.len());
    let rest = &content[after_label..];
    let op_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let after_op = after_label + op_end;
    match content[after_op..].find(|c: char| !c.is_whitespace()) {
        Some(gap) => after_op + gap,
        None => content.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_card_dropped() {
        assert_eq!(normalize_card("//* this is a comment", false), CardKind::Comment);
    }

    #[test]
    fn end_of_deck_marker_dropped() {
        assert_eq!(normalize_card("/* end of deck", false), CardKind::Comment);
    }

    #[test]
    fn bare_end_of_job_dropped() {
        assert_eq!(normalize_card("//", false), CardKind::EndOfJob);
    }

    #[test]
    fn truncates_beyond_column_72() {
        let long = format!("//STEP1 EXEC PGM=IEFBR14{}", "X".repeat(60));
        match normalize_card(&long, false) {
            CardKind::Statement(s) => assert!(s.len() <= CARD_COLUMN_LIMIT),
            other => panic!("expected Statement, got {other:?}"),
        }
    }

    #[test]
    fn inline_comment_stripped_after_operand_space() {
        match normalize_card("//STEP1 EXEC PGM=X  this is a comment", false) {
            CardKind::Statement(s) => assert_eq!(s, "STEP1 EXEC PGM=X"),
            other => panic!("expected Statement, got {other:?}"),
        }
    }

    #[test]
    fn comment_stripping_respects_quotes() {
        // Invariant 1 (§8): space inside a quoted literal is not a comment boundary.
        match normalize_card("//L OP a='b c' comment", false) {
            CardKind::Statement(s) => assert_eq!(s, "L OP a='b c'"),
            other => panic!("expected Statement, got {other:?}"),
        }
    }

    #[test]
    fn continuation_card_has_no_operator_prefix() {
        match normalize_card("//          DISP=(NEW,CATLG)", true) {
            CardKind::Continuation(s) => assert_eq!(s, "DISP=(NEW,CATLG)"),
            other => panic!("expected Continuation, got {other:?}"),
        }
    }
}
