//! Resolution trace
//!
//! An append-only log of what the injectors did, rendered as an
//! indented tree when an error needs to show the active resolution
//! stack. Nothing reads it to make decisions.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A single trace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Resolution of a name started
    Request(String),
    /// The dependency names about to be resolved
    DependsOn(Vec<String>),
    /// Free-form annotation
    Note(String),
    /// The innermost open request finished
    Received,
}

/// Shared, append-only trace log.
///
/// Clones share the same log. A container creates one and hands it to
/// both of its injectors; it is never reset.
///
/// # Examples
///
/// ```rust
/// use named_injector::Tracer;
///
/// let tracer = Tracer::new();
/// tracer.request("Test");
/// tracer.depends_on(&["A".to_string(), "B".to_string()]);
/// tracer.note("Some note");
/// tracer.received();
///
/// assert_eq!(
///     tracer.to_string(),
///     "Test requested (\n\tDependencies: [A, B]\n\tNote: Some note\n)"
/// );
/// ```
#[derive(Clone, Default)]
pub struct Tracer {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl Tracer {
    /// Create an empty log.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a resolution.
    pub fn request(&self, name: &str) {
        self.push(TraceEvent::Request(name.to_owned()));
    }

    /// Record the dependency names of a factory.
    pub fn depends_on(&self, dependencies: &[String]) {
        self.push(TraceEvent::DependsOn(dependencies.to_vec()));
    }

    /// Record an annotation.
    pub fn note(&self, message: impl Into<String>) {
        self.push(TraceEvent::Note(message.into()));
    }

    /// Record the end of the innermost open request.
    pub fn received(&self) {
        self.push(TraceEvent::Received);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    #[inline]
    fn push(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self.events.lock();
        let mut level = 0usize;

        for (i, event) in events.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }

            if matches!(event, TraceEvent::Received) {
                level = level.saturating_sub(1);
            }
            for _ in 0..level {
                f.write_str("\t")?;
            }

            match event {
                TraceEvent::Request(name) => {
                    write!(f, "{name} requested (")?;
                    level += 1;
                }
                TraceEvent::DependsOn(deps) if deps.is_empty() => f.write_str("Dependencies: none")?,
                TraceEvent::DependsOn(deps) => write!(f, "Dependencies: [{}]", deps.join(", "))?,
                TraceEvent::Note(note) => write!(f, "Note: {note}")?,
                TraceEvent::Received => f.write_str(")")?,
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("events", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_request() {
        let tracer = Tracer::new();
        tracer.request("Test");
        tracer.depends_on(&["A".into(), "B".into()]);
        tracer.note("Some note");
        tracer.received();

        assert_eq!(
            tracer.to_string(),
            "Test requested (\n\tDependencies: [A, B]\n\tNote: Some note\n)"
        );
    }

    #[test]
    fn test_render_nested_and_open_requests() {
        let tracer = Tracer::new();
        tracer.request("A");
        tracer.depends_on(&["B".into()]);
        tracer.request("B");
        tracer.depends_on(&[]);
        tracer.received();
        tracer.request("C");

        assert_eq!(
            tracer.to_string(),
            "A requested (\n\tDependencies: [B]\n\tB requested (\n\t\tDependencies: none\n\t)\n\tC requested ("
        );
    }

    #[test]
    fn test_clones_share_log() {
        let tracer = Tracer::new();
        let shared = tracer.clone();

        shared.note("from clone");

        assert_eq!(tracer.len(), 1);
        assert_eq!(tracer.events(), vec![TraceEvent::Note("from clone".into())]);
    }

    #[test]
    fn test_unbalanced_received_does_not_underflow() {
        let tracer = Tracer::new();
        tracer.received();
        tracer.note("still flat");

        assert_eq!(tracer.to_string(), ")\nNote: still flat");
    }
}
