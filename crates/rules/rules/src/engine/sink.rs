//! Destinations for reports and trace entries.
//!
//! Sinks are owned by the caller and passed to each run. They take `&self`
//! so one sink can be shared by runs over several files in parallel.

use std::sync::{Mutex, PoisonError};

use super::report::Report;
use super::trace::TraceEntry;

/// Receives one call per fired rule, in traversal order.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: Report);
}

/// Receives one call per filter rejection of a rule with tracing enabled.
pub trait TraceSink: Send + Sync {
    fn trace(&self, entry: TraceEntry);
}

impl<F> ReportSink for F
where
    F: Fn(Report) + Send + Sync,
{
    fn report(&self, report: Report) {
        self(report);
    }
}

impl<F> TraceSink for F
where
    F: Fn(TraceEntry) + Send + Sync,
{
    fn trace(&self, entry: TraceEntry) {
        self(entry);
    }
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl ReportSink for Discard {
    fn report(&self, _: Report) {}
}

impl TraceSink for Discard {
    fn trace(&self, _: TraceEntry) {}
}

/// A sink that keeps everything it receives, in arrival order.
#[derive(Debug)]
pub struct Collector<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Collector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for Collector<Report> {
    fn report(&self, report: Report) {
        self.push(report);
    }
}

impl TraceSink for Collector<TraceEntry> {
    fn trace(&self, entry: TraceEntry) {
        self.push(entry);
    }
}
