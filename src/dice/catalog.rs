use anyhow::{anyhow, bail, Result};
use indexmap::IndexSet;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::dice::model::{DicePath, DiceSet, Distribution};

/// Smallest number of faces of a single die in a random split.
const MIN_SPLIT_SIDES: usize = 3;

/// Faces of the Munoz-Perera dice split into pairs of 6-sided dice.
const DOUBLE_DICE_SIDES: usize = 12;

/// Number of ways to pick the first 6 of 12 distinct faces.
const MAX_DOUBLE_SPLITS: usize = 924;

/// Well-known intransitive dice sets and generators for larger families.
pub struct DiceCatalog;

impl DiceCatalog {
    pub fn names() -> &'static [&'static str] {
        &["efron", "miwin", "oskar", "grime", "example-1", "example-2"]
    }

    /// Look up a fixed set by name, or `munoz-perera-<N>` for the generated
    /// family.
    pub fn by_name(name: &str) -> Result<DiceSet> {
        let set = match name {
            "efron" => Self::efron(),
            "miwin" => Self::miwin(),
            "oskar" => Self::oskar(),
            "grime" => Self::grime(),
            "example-1" => Self::example_1(),
            "example-2" => Self::example_2(),
            other => {
                let sides = other
                    .strip_prefix("munoz-perera-")
                    .ok_or_else(|| anyhow!("Unknown dice set '{}'", other))?;
                let sides: usize = sides
                    .parse()
                    .map_err(|_| anyhow!("Invalid Munoz-Perera size in '{}'", other))?;
                Self::munoz_perera(sides)?
            }
        };
        Ok(set)
    }

    pub fn efron() -> DiceSet {
        DiceSet::from_int_rows(
            "Efron dice",
            &[
                &[4, 4, 4, 4, 0, 0],
                &[3, 3, 3, 3, 3, 3],
                &[6, 6, 2, 2, 2, 2],
                &[5, 5, 5, 1, 1, 1],
            ],
        )
    }

    pub fn miwin() -> DiceSet {
        DiceSet::from_int_rows(
            "Miwin dice",
            &[
                &[1, 2, 5, 6, 7, 9],
                &[1, 3, 4, 5, 8, 9],
                &[2, 3, 4, 6, 7, 8],
            ],
        )
    }

    pub fn oskar() -> DiceSet {
        DiceSet::from_int_rows("Oskar dice", &OSKAR_ROWS)
    }

    pub fn grime() -> DiceSet {
        DiceSet::from_int_rows(
            "Grime dice",
            &[
                &[2, 2, 2, 7, 7, 7],
                &[1, 1, 6, 6, 6, 6],
                &[0, 5, 5, 5, 5, 5],
                &[4, 4, 4, 4, 4, 9],
                &[3, 3, 3, 3, 8, 8],
            ],
        )
    }

    pub fn example_1() -> DiceSet {
        DiceSet::from_int_rows(
            "Example 1 dice",
            &[
                &[2, 2, 4, 4, 9, 9],
                &[1, 1, 6, 6, 8, 8],
                &[3, 3, 5, 5, 7, 7],
            ],
        )
    }

    /// Same faces as the 6-sided Munoz-Perera dice.
    pub fn example_2() -> DiceSet {
        DiceSet::from_int_rows(
            "Example 2 dice",
            &[
                &[1, 12, 17, 22, 27, 32],
                &[2, 7, 18, 23, 28, 33],
                &[3, 8, 13, 24, 29, 34],
                &[4, 9, 14, 19, 30, 35],
                &[5, 10, 15, 20, 25, 36],
                &[6, 11, 16, 21, 26, 31],
            ],
        )
    }

    /// Each Oskar die paired with an identical copy, the sum of both faces
    /// being the outcome.
    pub fn double_oskar() -> Result<DiceSet> {
        let dice = OSKAR_ROWS
            .iter()
            .map(|row| {
                let die = Distribution::from_ints(row);
                Distribution::sum_of(&[die.clone(), die])
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DiceSet::new("Oskar double dice", dice))
    }

    /// Face values `v[n][j] = (j - 1) * N + (N + n - j) mod N + 1` for
    /// `n, j` in `1..=N`.
    pub fn munoz_perera_matrix(sides: usize) -> Result<Vec<Vec<i64>>> {
        if sides < 3 {
            bail!("Munoz-Perera dice need at least 3 sides, got {}", sides);
        }
        let n_total = sides as i64;
        let matrix = (1..=n_total)
            .map(|n| {
                (1..=n_total)
                    .map(|j| (j - 1) * n_total + (n_total + n - j) % n_total + 1)
                    .collect()
            })
            .collect();
        Ok(matrix)
    }

    /// N fair N-sided dice where `D_n` beats `D_(n-1)` and `D_0` beats
    /// `D_(N-1)`.
    pub fn munoz_perera(sides: usize) -> Result<DiceSet> {
        let matrix = Self::munoz_perera_matrix(sides)?;
        let dice = matrix.iter().map(|row| Distribution::from_ints(row)).collect();
        Ok(DiceSet::new(
            format!("Munoz-Perera {}-sided dice", sides),
            dice,
        ))
    }

    /// Intransitive path `N-1, N-2, ..., 0, N-1` of the Munoz-Perera dice.
    pub fn munoz_perera_path(sides: usize) -> DicePath {
        let mut indices: Vec<usize> = (0..sides).rev().collect();
        if sides > 0 {
            indices.push(sides - 1);
        }
        DicePath::new(indices)
    }

    /// Split every N-sided Munoz-Perera die into `N / sides_per_die` dice with
    /// `sides_per_die` faces each, summed when rolled together.
    pub fn munoz_perera_tuples(sides: usize, sides_per_die: usize) -> Result<DiceSet> {
        if sides_per_die == 0 || sides % sides_per_die != 0 {
            bail!(
                "{} sides cannot be split into dice with {} sides",
                sides,
                sides_per_die
            );
        }
        let matrix = Self::munoz_perera_matrix(sides)?;
        let dice = matrix
            .iter()
            .map(|row| {
                let parts: Vec<Distribution> = row
                    .chunks(sides_per_die)
                    .map(Distribution::from_ints)
                    .collect();
                Distribution::sum_of(&parts)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DiceSet::new(
            format!(
                "{} tuples of {} {}-sided dice from {}x{} Munoz-Perera dice",
                sides,
                sides / sides_per_die,
                sides_per_die,
                sides,
                sides
            ),
            dice,
        ))
    }

    /// Split every Munoz-Perera die into a random number of dice with random
    /// face counts of at least three.
    pub fn munoz_perera_random_tuples(sides: usize, seed: u64) -> Result<DiceSet> {
        let matrix = Self::munoz_perera_matrix(sides)?;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let dice = matrix
            .iter()
            .map(|row| {
                let parts = random_partition(row, &mut rng);
                Distribution::sum_of(&parts)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DiceSet::new(
            format!(
                "{} tuples of randomly split dice from {}x{} Munoz-Perera dice",
                sides, sides, sides
            ),
            dice,
        ))
    }

    /// `count` sets of 12 double dice. Die `n` of every set is row `n` of the
    /// 12x12 Munoz-Perera matrix split into two sorted 6-sided dice. The
    /// first set keeps the rows in order, later sets use seeded shuffles, and
    /// no split repeats within a row across the sets.
    pub fn random_double_dice_sets(count: usize, seed: u64) -> Result<Vec<DiceSet>> {
        let splits = random_double_splits(count, seed)?;
        splits
            .iter()
            .enumerate()
            .map(|(idx, rows)| {
                let dice = rows
                    .iter()
                    .map(|row| {
                        let (first, second) = row.split_at(DOUBLE_DICE_SIDES / 2);
                        Distribution::sum_of(&[
                            Distribution::from_ints(first),
                            Distribution::from_ints(second),
                        ])
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(DiceSet::new(
                    format!(
                        "Random double dice {} from {}x{} Munoz-Perera dice",
                        idx + 1,
                        DOUBLE_DICE_SIDES,
                        DOUBLE_DICE_SIDES
                    ),
                    dice,
                ))
            })
            .collect()
    }
}

/// Face splits behind [`DiceCatalog::random_double_dice_sets`]: one entry per
/// set, holding per die the 12 faces with both halves sorted.
fn random_double_splits(count: usize, seed: u64) -> Result<Vec<Vec<Vec<i64>>>> {
    if count > MAX_DOUBLE_SPLITS {
        bail!(
            "At most {} distinct double dice splits exist per row, requested {}",
            MAX_DOUBLE_SPLITS,
            count
        );
    }
    let mut rows = DiceCatalog::munoz_perera_matrix(DOUBLE_DICE_SIDES)?;
    let mut used: Vec<IndexSet<Vec<i64>>> = vec![IndexSet::new(); rows.len()];
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut sets = Vec::with_capacity(count);
    for _ in 0..count {
        let mut split_rows = Vec::with_capacity(rows.len());
        for (row, seen) in rows.iter_mut().zip(used.iter_mut()) {
            loop {
                let mut split = row.clone();
                let (first, second) = split.split_at_mut(DOUBLE_DICE_SIDES / 2);
                first.sort_unstable();
                second.sort_unstable();
                row.shuffle(&mut rng);
                if seen.insert(split.clone()) {
                    split_rows.push(split);
                    break;
                }
            }
        }
        sets.push(split_rows);
    }
    Ok(sets)
}

const OSKAR_ROWS: [&[i64]; 7] = [
    &[2, 2, 14, 14, 17, 17],
    &[7, 7, 10, 10, 16, 16],
    &[5, 5, 13, 13, 15, 15],
    &[3, 3, 9, 9, 21, 21],
    &[1, 1, 12, 12, 20, 20],
    &[6, 6, 8, 8, 19, 19],
    &[4, 4, 11, 11, 18, 18],
];

fn random_partition<R: Rng>(row: &[i64], rng: &mut R) -> Vec<Distribution> {
    let mut parts = Vec::new();
    let mut start = 0;
    while start < row.len() {
        let lower = (start + MIN_SPLIT_SIDES).min(row.len());
        let mut end = rng.gen_range(lower..=row.len());
        if end + MIN_SPLIT_SIDES > row.len() {
            end = row.len();
        }
        parts.push(Distribution::from_ints(&row[start..end]));
        start = end;
    }
    parts
}
