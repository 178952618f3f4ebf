//! Level registry
//!
//! Holds level definitions keyed by id plus an explicit order. The order is
//! insertion order until `move_to` rearranges it; selection and tie-breaking
//! follow it.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ProcessingError;
use crate::level::validation::validate_level;
use crate::level::{Level, LevelInfo, LevelUpdate};

#[derive(Debug, Clone)]
pub struct LevelRegistry {
    levels: HashMap<String, Level>,
    order: Vec<String>,
    min_timeout_ms: u64,
}

impl LevelRegistry {
    /// Create an empty registry enforcing the given minimum timeout
    pub fn new(min_timeout_ms: u64) -> Self {
        Self {
            levels: HashMap::new(),
            order: Vec::new(),
            min_timeout_ms,
        }
    }

    pub fn min_timeout_ms(&self) -> u64 {
        self.min_timeout_ms
    }

    /// Add a level at the end of the order.
    ///
    /// Returns false (and leaves the registry untouched) when the id is
    /// already registered or the definition is invalid.
    pub fn add<S: AsRef<str>>(
        &mut self,
        level_id: &str,
        dimension: f64,
        phases: &[S],
        timeout_ms: u64,
    ) -> bool {
        if self.levels.contains_key(level_id) {
            debug!(level_id, "level already exists");
            return false;
        }

        match validate_level(level_id, dimension, phases, timeout_ms, self.min_timeout_ms) {
            Ok(level) => {
                debug!(
                    level_id,
                    dimension,
                    phases = level.phases.len(),
                    timeout_ms,
                    "level added"
                );
                self.order.push(level.id.clone());
                self.levels.insert(level.id.clone(), level);
                true
            }
            Err(validation) => {
                debug!(level_id, errors = %validation, "invalid level definition");
                false
            }
        }
    }

    /// Remove a level. The last remaining level cannot be removed.
    pub fn remove(&mut self, level_id: &str) -> bool {
        if !self.levels.contains_key(level_id) {
            debug!(level_id, "level not found");
            return false;
        }
        if self.levels.len() <= 1 {
            debug!(level_id, "cannot remove the last remaining level");
            return false;
        }

        self.levels.remove(level_id);
        self.order.retain(|id| id != level_id);
        debug!(level_id, remaining = self.levels.len(), "level removed");
        true
    }

    /// Apply a partial update atomically: the merged definition is validated
    /// as a whole and nothing changes if any field is invalid.
    pub fn edit(&mut self, level_id: &str, update: &LevelUpdate) -> bool {
        let Some(current) = self.levels.get(level_id) else {
            debug!(level_id, "level not found");
            return false;
        };

        let dimension = update.dimension.unwrap_or(current.dimension);
        let timeout_ms = update.timeout_ms.unwrap_or(current.timeout_ms);
        let phases: Vec<String> = match &update.phases {
            Some(phases) => phases.clone(),
            None => current
                .phases
                .iter()
                .map(|phase| phase.as_str().to_string())
                .collect(),
        };

        match validate_level(level_id, dimension, &phases, timeout_ms, self.min_timeout_ms) {
            Ok(level) => {
                debug!(level_id, "level updated");
                self.levels.insert(level_id.to_string(), level);
                true
            }
            Err(validation) => {
                debug!(level_id, errors = %validation, "invalid level update");
                false
            }
        }
    }

    /// Move a level to `position` in the order, clamped to the valid range.
    pub fn move_to(&mut self, level_id: &str, position: usize) -> bool {
        let Some(current) = self.order.iter().position(|id| id == level_id) else {
            debug!(level_id, "level not found");
            return false;
        };

        let target = position.min(self.order.len() - 1);
        let id = self.order.remove(current);
        self.order.insert(target, id);
        debug!(level_id, from = current, to = target, "level moved");
        true
    }

    pub fn get(&self, level_id: &str) -> Option<&Level> {
        self.levels.get(level_id)
    }

    pub fn contains(&self, level_id: &str) -> bool {
        self.levels.contains_key(level_id)
    }

    /// Look up a level with its position, or a `LEVEL_NOT_FOUND` error
    /// listing the registered ids.
    pub fn info(&self, level_id: &str) -> Result<LevelInfo, ProcessingError> {
        self.order
            .iter()
            .position(|id| id == level_id)
            .and_then(|position| {
                self.levels.get(level_id).map(|level| LevelInfo {
                    level: level.clone(),
                    position,
                })
            })
            .ok_or_else(|| ProcessingError::level_not_found(level_id, self.ids()))
    }

    pub fn all_info(&self) -> HashMap<String, LevelInfo> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(position, id)| {
                self.levels.get(id).map(|level| {
                    (
                        id.clone(),
                        LevelInfo {
                            level: level.clone(),
                            position,
                        },
                    )
                })
            })
            .collect()
    }

    /// Levels in order
    pub fn iter(&self) -> impl Iterator<Item = &Level> + '_ {
        self.order.iter().filter_map(|id| self.levels.get(id))
    }

    /// Level ids in order
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
