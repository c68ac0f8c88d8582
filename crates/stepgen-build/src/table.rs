//! Per-configuration step table
//!
//! Collection hands the table to finalize. Each entry lists, in creation
//! order, the indices of the steps a tool appended to that configuration's
//! custom build step collection. Keys keep their insertion order.

use crate::target::Target;
use serde::Serialize;

/// Steps registered for one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepTableEntry {
    pub target: Target,
    /// Indices into the configuration's `custom_build_steps`
    pub steps: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepTable {
    entries: Vec<StepTableEntry>,
}

impl StepTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, target: Target) -> &mut StepTableEntry {
        let position = match self.entries.iter().position(|e| e.target == target) {
            Some(position) => position,
            None => {
                self.entries.push(StepTableEntry {
                    target,
                    steps: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }

    /// Register a configuration, even if it ends up with no steps
    pub fn ensure(&mut self, target: Target) {
        self.entry_mut(target);
    }

    /// Record a step index for a configuration
    pub fn push(&mut self, target: Target, index: usize) {
        self.entry_mut(target).steps.push(index);
    }

    /// Step indices for a configuration
    pub fn get(&self, target: &Target) -> Option<&[usize]> {
        self.entries
            .iter()
            .find(|e| e.target == *target)
            .map(|e| e.steps.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepTableEntry> {
        self.entries.iter()
    }

    /// Number of configurations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of steps across configurations
    pub fn step_count(&self) -> usize {
        self.entries.iter().map(|e| e.steps.len()).sum()
    }
}
