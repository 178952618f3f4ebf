//! Dimension selector: picks the level whose dimension is nearest the target.

use serde::Serialize;
use tracing::warn;

use crate::level::Level;

/// Outcome of a selection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub level_id: String,
    /// Absent when no target dimension was given
    pub distance: Option<f64>,
    pub within_tolerance: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DimensionSelector {
    max_distance: f64,
}

impl DimensionSelector {
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Select from `levels`, which must be in registry order.
    ///
    /// Without a target the first level wins. Otherwise the level with the
    /// smallest absolute distance wins and ties go to the earlier level. A
    /// winner beyond the tolerance is still returned, with a warning.
    pub fn select<'a, I>(&self, levels: I, target: Option<f64>) -> Option<Selection>
    where
        I: IntoIterator<Item = &'a Level>,
    {
        let mut levels = levels.into_iter();

        let Some(target) = target else {
            return levels.next().map(|level| Selection {
                level_id: level.id.clone(),
                distance: None,
                within_tolerance: true,
            });
        };

        let mut best: Option<(&Level, f64)> = None;
        for level in levels {
            let distance = (level.dimension - target).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((level, distance)),
            }
        }

        best.map(|(level, distance)| {
            let within_tolerance = distance <= self.max_distance;
            if !within_tolerance {
                warn!(
                    level_id = %level.id,
                    target,
                    distance,
                    max_distance = self.max_distance,
                    "selected level is beyond the maximum dimension distance"
                );
            }
            Selection {
                level_id: level.id.clone(),
                distance: Some(distance),
                within_tolerance,
            }
        })
    }
}

impl Default for DimensionSelector {
    fn default() -> Self {
        Self::new(1.0)
    }
}
