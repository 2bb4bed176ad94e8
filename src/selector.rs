//! Sheet picker state: exactly one active sheet out of the loaded ones.

use color_eyre::eyre::eyre;
use color_eyre::Result;

#[derive(Debug, Clone)]
pub struct SheetSelector {
    names: Vec<String>,
    active: usize,
}

impl SheetSelector {
    /// Fails when there is nothing to show.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(eyre!("No sheets loaded; nothing to show"));
        }
        Ok(Self { names, active: 0 })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_name(&self) -> &str {
        &self.names[self.active]
    }

    /// Returns true when the active sheet changed.
    pub fn select_index(&mut self, index: usize) -> bool {
        if index >= self.names.len() || index == self.active {
            return false;
        }
        self.active = index;
        true
    }

    pub fn select_name(&mut self, name: &str) -> Result<bool> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| {
                eyre!(
                    "Sheet '{}' is not loaded (available: {})",
                    name,
                    self.names.join(", ")
                )
            })?;
        Ok(self.select_index(index))
    }

    pub fn select_next(&mut self) -> bool {
        self.select_index((self.active + 1) % self.names.len())
    }

    pub fn select_previous(&mut self) -> bool {
        let len = self.names.len();
        self.select_index((self.active + len - 1) % len)
    }
}
