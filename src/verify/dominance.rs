use std::fmt::Write;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Win counts of two dice against each other: `wins` pairs where the first
/// die shows the larger face, `losses` where the second does. Ties are in
/// neither count but still part of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatCount {
    pub wins: usize,
    pub losses: usize,
    pub total: usize,
}

impl BeatCount {
    pub fn ties(&self) -> usize {
        self.total - self.wins - self.losses
    }

    pub fn probability(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64
        }
    }

    /// Exact comparison of P(X>Y) against one half.
    pub fn dominates(&self) -> bool {
        2 * self.wins > self.total
    }
}

/// Fraction of the `|x| * |y|` ordered pairs in which the face of `x` is
/// strictly greater than the face of `y`.
pub fn probability_to_beat(x: &[f64], y: &[f64]) -> f64 {
    count_beats(x, y).probability()
}

pub fn count_beats(x: &[f64], y: &[f64]) -> BeatCount {
    let mut wins = 0;
    let mut losses = 0;
    for a in x {
        for b in y {
            if a > b {
                wins += 1;
            } else if b > a {
                losses += 1;
            }
        }
    }
    BeatCount {
        wins,
        losses,
        total: x.len() * y.len(),
    }
}

/// Same counts as [`count_beats`], computed on sorted copies with a merge
/// sweep. Preferable for large multi-dice.
pub fn count_beats_sorted(x: &[f64], y: &[f64]) -> BeatCount {
    let mut xs = x.to_vec();
    let mut ys = y.to_vec();
    xs.sort_by(f64::total_cmp);
    ys.sort_by(f64::total_cmp);

    let mut wins = 0;
    let mut losses = 0;
    // below: faces of y strictly less than a; at_or_below: faces <= a
    let mut below = 0;
    let mut at_or_below = 0;
    for a in &xs {
        while below < ys.len() && ys[below] < *a {
            below += 1;
        }
        while at_or_below < ys.len() && ys[at_or_below] <= *a {
            at_or_below += 1;
        }
        wins += below;
        losses += ys.len() - at_or_below;
    }
    BeatCount {
        wins,
        losses,
        total: xs.len() * ys.len(),
    }
}

/// Row-major matrix of P(D_i beats D_j) for every ordered pair of a dice set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominanceMatrix {
    pub size: usize,
    pub counts: Vec<BeatCount>,
}

impl DominanceMatrix {
    pub fn compute<D>(dice: &[D]) -> Self
    where
        D: AsRef<[f64]> + Sync,
    {
        let size = dice.len();
        let counts = (0..size)
            .into_par_iter()
            .flat_map_iter(|i| {
                dice.iter()
                    .map(move |other| count_beats_sorted(dice[i].as_ref(), other.as_ref()))
            })
            .collect();
        Self { size, counts }
    }

    pub fn count(&self, from: usize, to: usize) -> Option<BeatCount> {
        if from >= self.size || to >= self.size {
            return None;
        }
        self.counts.get(from * self.size + to).copied()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.count(from, to).map(|count| count.probability())
    }

    pub fn row(&self, from: usize) -> Vec<f64> {
        (0..self.size)
            .filter_map(|to| self.get(from, to))
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for from in 0..self.size {
            let _ = write!(out, " D{:02}:", from);
            for p in self.row(from) {
                let _ = write!(out, " {:.3}", p);
            }
            let _ = writeln!(out);
        }
        out
    }
}

/// Outcome of checking `A > C > B` for an inserted die `C`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominanceReport {
    pub p_ab: f64,
    pub p_ac: f64,
    pub p_cb: f64,
    pub is_intransitive_insert: bool,
    pub explanation: String,
}

pub struct DominanceChecker;

impl DominanceChecker {
    pub fn assess(a: &[f64], b: &[f64], c: &[f64]) -> DominanceReport {
        let mut explanation = String::new();

        let ab = count_beats(a, b);
        let ac = count_beats(a, c);
        let cb = count_beats(c, b);

        let _ = writeln!(
            explanation,
            "P(A>B)={:.3}: {}",
            ab.probability(),
            ab.dominates()
        );
        let _ = writeln!(
            explanation,
            "P(A>C)={:.3}: {}",
            ac.probability(),
            ac.dominates()
        );
        let _ = writeln!(
            explanation,
            "P(C>B)={:.3}: {}",
            cb.probability(),
            cb.dominates()
        );

        let is_intransitive_insert = ab.dominates() && ac.dominates() && cb.dominates();
        let _ = writeln!(explanation, "A > C > B: {}", is_intransitive_insert);

        DominanceReport {
            p_ab: ab.probability(),
            p_ac: ac.probability(),
            p_cb: cb.probability(),
            is_intransitive_insert,
            explanation,
        }
    }
}
