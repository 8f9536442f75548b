use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dice::{DicePath, DiceSet, Distribution};
use crate::insertion::{
    elementwise_midpoint, tied_midpoint, InsertionConfig, Normalizer, ThresholdSearch,
};
use crate::verify::dominance::count_beats;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Number of dice at which insertion stops.
    pub max_dice: usize,
    /// Try the face-by-face midpoint when the threshold search fails, and
    /// the plain mean between two dice with P = 1/2.
    pub midpoint_fallback: bool,
    pub insertion: InsertionConfig,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            max_dice: 20,
            midpoint_fallback: true,
            insertion: InsertionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionStats {
    pub rounds: usize,
    pub inserted: usize,
    pub midpoint_fallbacks: usize,
    pub failed_pairs: usize,
}

#[derive(Debug, Clone)]
pub struct ExtensionSummary {
    pub set: DiceSet,
    pub path: DicePath,
    pub stats: ExtensionStats,
    pub duration: Duration,
}

/// Grows an intransitive path of dice by inserting a new die between every
/// pair of neighbours, round after round, until `max_dice` is reached.
pub struct CycleExtension {
    config: ExtensionConfig,
    search: ThresholdSearch,
}

impl CycleExtension {
    pub fn new(config: ExtensionConfig) -> Self {
        Self {
            search: ThresholdSearch::new(config.insertion),
            config,
        }
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    pub fn execute(&self, set: &DiceSet, path: &DicePath) -> Result<ExtensionSummary> {
        let start = Instant::now();
        self.config.insertion.validate()?;
        if path.len() < 2 {
            bail!("Cycle extension needs a path with at least two dice, got '{}'", path);
        }
        if let Some(max) = path.max_index() {
            if max >= set.len() {
                bail!(
                    "Path index {} out of bounds for dice set '{}' of size {}",
                    max,
                    set.name,
                    set.len()
                );
            }
        }

        let closed = path.is_closed();
        let selected: Vec<&Distribution> =
            path.visited().iter().map(|&idx| &set.dice()[idx]).collect();
        let mut current = normalized_integers(&selected)?;
        let mut stats = ExtensionStats::default();

        info!(
            "Extending {} path '{}' of {} dice to at most {} dice",
            set.name,
            path,
            current.len(),
            self.config.max_dice
        );

        while current.len() < self.config.max_dice {
            let doubled = double_values(&current);
            let pair_count = if closed {
                doubled.len()
            } else {
                doubled.len() - 1
            };

            let outcomes: Vec<PairOutcome> = (0..pair_count)
                .into_par_iter()
                .map(|idx| {
                    let next = (idx + 1) % doubled.len();
                    self.insert_between(&doubled[idx], &doubled[next])
                })
                .collect();

            let mut extended = Vec::with_capacity(doubled.len() * 2);
            let mut inserted = 0;
            let count = doubled.len();
            let paired = doubled.into_iter().zip(outcomes_padded(outcomes, count));
            for (idx, (die, outcome)) in paired.enumerate() {
                extended.push(die);
                let originals_left = count - idx - 1;
                match outcome {
                    Some(PairOutcome::Inserted { die, midpoint }) => {
                        if extended.len() + originals_left < self.config.max_dice {
                            extended.push(die);
                            inserted += 1;
                            if midpoint {
                                stats.midpoint_fallbacks += 1;
                            }
                        }
                    }
                    Some(PairOutcome::Failed) => stats.failed_pairs += 1,
                    None => {}
                }
            }

            stats.rounds += 1;
            info!(
                "Round {}: inserted {} dice, now {} dice",
                stats.rounds,
                inserted,
                extended.len()
            );
            if inserted == 0 {
                break;
            }
            stats.inserted += inserted;
            current = extended;
        }

        let dice = shift_to_one(current)?;
        let count = dice.len();
        let path = if closed {
            DicePath::closed_sequence(count)
        } else {
            DicePath::new((0..count).collect())
        };
        let set = DiceSet::new(format!("{} extended to {} dice", set.name, count), dice);

        Ok(ExtensionSummary {
            set,
            path,
            stats,
            duration: start.elapsed(),
        })
    }

    fn insert_between(&self, left: &Distribution, right: &Distribution) -> PairOutcome {
        let (upper, lower) = if count_beats(left, right).dominates() {
            (left, right)
        } else if count_beats(right, left).dominates() {
            (right, left)
        } else {
            return self.insert_between_even(left, right);
        };

        match self.search.insert(upper, lower) {
            Ok(insertion) => {
                if let Some(die) = insertion.integral() {
                    return PairOutcome::Inserted {
                        die,
                        midpoint: false,
                    };
                }
                debug!(
                    "No integer between {} and {}",
                    insertion.report.lower_bracket, insertion.report.upper_bracket
                );
            }
            Err(err) => debug!("Threshold search failed: {}", err),
        }

        if self.config.midpoint_fallback {
            if let Ok(die) = elementwise_midpoint(upper, lower) {
                return PairOutcome::Inserted {
                    die,
                    midpoint: true,
                };
            }
        }
        PairOutcome::Failed
    }

    /// Neither die dominates: only a die that keeps both relations at
    /// exactly 1/2 fits between them.
    fn insert_between_even(&self, left: &Distribution, right: &Distribution) -> PairOutcome {
        if !self.config.midpoint_fallback {
            debug!("Neither die dominates the other, skipping pair");
            return PairOutcome::Failed;
        }
        match tied_midpoint(left, right) {
            Ok(die) => PairOutcome::Inserted {
                die,
                midpoint: true,
            },
            Err(err) => {
                debug!("No die between non-dominating pair: {}", err);
                PairOutcome::Failed
            }
        }
    }
}

enum PairOutcome {
    Inserted { die: Distribution, midpoint: bool },
    Failed,
}

/// Align per-pair outcomes with the dice they follow; an open path has no
/// outcome after its last die.
fn outcomes_padded(
    outcomes: Vec<PairOutcome>,
    len: usize,
) -> impl Iterator<Item = Option<PairOutcome>> {
    let pad = len.saturating_sub(outcomes.len());
    outcomes
        .into_iter()
        .map(Some)
        .chain(std::iter::repeat_with(|| None).take(pad))
}

/// Integers with minimum 1, scaled so that distinct values stay distinct.
fn normalized_integers(dice: &[&Distribution]) -> Result<Vec<Distribution>> {
    let factor = if dice.iter().all(|die| die.is_integral()) {
        1.0
    } else {
        Normalizer::order_preserving_factor(dice)
    };
    let normalized = Normalizer::normalize(dice, factor)?;
    Ok(normalized.to_distributions())
}

/// `v -> 2v + 1 - 2 * min`: keeps every comparison, maps the minimum to 1
/// and leaves a gap of at least 2 between distinct integers.
fn double_values(dice: &[Distribution]) -> Vec<Distribution> {
    let min = dice
        .iter()
        .filter_map(Distribution::min_value)
        .reduce(f64::min)
        .unwrap_or(0.0);
    dice.iter()
        .map(|die| die.mul_add(2.0, 1.0 - 2.0 * min))
        .collect()
}

fn shift_to_one(dice: Vec<Distribution>) -> Result<Vec<Distribution>> {
    let normalized = Normalizer::normalize(&dice, 1.0)?;
    Ok(normalized.to_distributions())
}
