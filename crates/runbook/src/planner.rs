//! Runbook - the ordered list of steps a run applies

use crate::step::{BoxedStep, Step};

/// Steps in the order they must run
pub struct Runbook {
    pub steps: Vec<BoxedStep>,
}

impl Runbook {
    /// Create a new empty runbook
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step; it runs after every step added before it
    pub fn add(&mut self, step: BoxedStep) {
        self.steps.push(step);
    }

    /// Builder-style [`Runbook::add`]
    pub fn then(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the runbook is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in execution order
    pub fn ids(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    /// Position of a step by id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == id)
    }
}

impl Default for Runbook {
    fn default() -> Self {
        Self::new()
    }
}
