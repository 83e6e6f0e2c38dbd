use super::Diagnostic;

/// A pure-sink subscriber: given a diagnostic, it does whatever it likes
/// (print, count, ignore) but never hands anything back.
type Subscriber = Box<dyn Fn(&Diagnostic) + Send + Sync>;

/// Typed observable for diagnostics. `report` never returns a value and
/// never interrupts the caller - subscribers are the only side effect.
#[derive(Default)]
pub struct DiagnosticsBus {
    subscribers: Vec<Subscriber>,
}

impl DiagnosticsBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, f: F)
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(f));
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        for subscriber in &self.subscribers {
            subscriber(&diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use std::sync::{Arc, Mutex};

    #[test]
    fn subscribers_receive_reported_diagnostics() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = DiagnosticsBus::new();
        let seen_clone = Arc::clone(&seen);
        bus.subscribe(move |d| seen_clone.lock().unwrap().push(d.kind));

        bus.report(Diagnostic::new(DiagnosticKind::MixedContent, "mixed"));
        bus.report(Diagnostic::new(DiagnosticKind::WrongPrefix, "wrong"));

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![DiagnosticKind::MixedContent, DiagnosticKind::WrongPrefix]);
    }

    #[test]
    fn report_without_subscribers_does_not_panic() {
        let bus = DiagnosticsBus::new();
        bus.report(Diagnostic::new(DiagnosticKind::UnknownLocale, "x"));
    }
}
