//! In-stream payload capture (§4.6): recognizes the terminator for a
//! `DD *`/`DD DATA` allocation's data lines.

/// Tracks the active terminator rule for one in-stream data capture.
#[derive(Debug)]
pub struct PayloadCapture {
    /// `Some(delim)` for an explicit `DLM=xx` override; `None` for the
    /// default rule (a `/*` marker, or implicitly the next statement card).
    dlm: Option<String>,
}

pub enum Terminator {
    /// Not a terminator; the line is payload data.
    None,
    /// The terminator card itself, consumed and not reprocessed.
    Consumed,
    /// Implicit termination: the line is the next statement and must still
    /// be dispatched normally.
    Reemit,
}

impl PayloadCapture {
    pub fn new(dlm: Option<String>) -> Self {
        Self { dlm }
    }

    fn classify(&self, raw: &str) -> Terminator {
        if let Some(d) = &self.dlm {
            return if raw.trim_end() == d.as_str() {
                Terminator::Consumed
            } else {
                Terminator::None
            };
        }
        if raw.starts_with("/*") {
            return Terminator::Consumed;
        }
        if raw.starts_with("//") {
            return Terminator::Reemit;
        }
        Terminator::None
    }

    pub fn check(&self, raw: &str) -> Terminator {
        self.classify(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_reemits_next_statement() {
        let cap = PayloadCapture::new(None);
        assert!(matches!(cap.check("//NEXT DD DUMMY"), Terminator::Reemit));
    }

    #[test]
    fn default_rule_consumes_slash_star() {
        let cap = PayloadCapture::new(None);
        assert!(matches!(cap.check("/*"), Terminator::Consumed));
    }

    #[test]
    fn custom_delimiter_consumed_exactly() {
        let cap = PayloadCapture::new(Some("$$".to_string()));
        assert!(matches!(cap.check("$$"), Terminator::Consumed));
        assert!(matches!(cap.check("NOT IT"), Terminator::None));
    }

    #[test]
    fn custom_delimiter_overrides_default_rule_entirely() {
        let cap = PayloadCapture::new(Some("$$".to_string()));
        assert!(matches!(cap.check("//NEXT DD DUMMY"), Terminator::None));
        assert!(matches!(cap.check("/* not the end"), Terminator::None));
    }
}
