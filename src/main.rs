use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Serialize;

use dicecycle::{
    search_cycles, CdfCurve, CycleExtension, CycleVerifier, DiceCatalog, DicePath, DiceSet,
    DiceSetLoader, DominanceChecker, ExtensionConfig, Insertion, InsertionReport, Normalizer,
    Orientation, ThresholdSearch,
};

const MAX_PATHS: usize = 1000;
const MAX_PATHS_TO_PRINT: usize = 10;
const MAX_DOUBLINGS: usize = 16;

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

enum Command {
    Demo,
    Insert(PathBuf),
    Extend { dice: usize, sides: usize },
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut dice = None;
    let mut sides = None;
    let mut request = None;
    for arg in &args {
        if let Some(value) = arg.strip_prefix("-N=") {
            dice = Some(value.parse::<usize>().with_context(|| format!("parse {arg}"))?);
        } else if let Some(value) = arg.strip_prefix("-M=") {
            sides = Some(value.parse::<usize>().with_context(|| format!("parse {arg}"))?);
        } else if arg.starts_with('-') {
            bail!("Unknown option: {arg}\n{}", usage());
        } else if request.is_none() {
            request = Some(PathBuf::from(arg));
        } else {
            bail!("Unexpected extra argument: {arg}");
        }
    }

    match (request, dice, sides) {
        (None, None, None) => Ok(Command::Demo),
        (Some(path), None, None) => Ok(Command::Insert(path)),
        (None, Some(dice), Some(sides)) if dice >= 3 && sides >= 3 => {
            Ok(Command::Extend { dice, sides })
        }
        _ => bail!("Invalid arguments\n{}", usage()),
    }
}

fn usage() -> &'static str {
    "usage:\n  dicecycle                  run the built-in examples\n  dicecycle <request.json>   insert a die C with A > C > B\n  dicecycle -N=<n> -M=<m>    extend the m-sided Munoz-Perera dice to n intransitive dice\n\nThe examples stop tuple path checks at 18 dice and skip the 12-sided\nMunoz-Perera cycle search. Logs go to stderr; redirect it to keep a log file."
}

fn main() -> Result<()> {
    init_logging();
    match parse_args()? {
        Command::Demo => run_demo(),
        Command::Insert(path) => run_insertion(&path),
        Command::Extend { dice, sides } => run_extension(dice, sides),
    }
}

#[derive(Serialize)]
struct InsertionOutput<'a> {
    c: &'a [f64],
    integral_c: Option<Vec<f64>>,
    report: &'a InsertionReport,
    normalized: Option<Vec<Vec<i64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    curve: Option<CdfCurve>,
}

fn run_insertion(path: &Path) -> Result<()> {
    let request = DiceSetLoader::load_request(path)?;
    let search = ThresholdSearch::new(request.config);
    let insertion = search
        .insert(&request.a, &request.b)
        .with_context(|| format!("insert die for request {:?}", path))?;
    info!("{}", insertion.report.describe());

    let normalized = match request.scale {
        Some(scale) => {
            let triple = [request.a.values(), request.b.values(), insertion.die.values()];
            let normalized = Normalizer::normalize_preserving(&triple, scale, MAX_DOUBLINGS)?;
            if normalized.factor != scale {
                warn!(
                    "Scale factor {} changed a dominance relation, used {} instead",
                    scale, normalized.factor
                );
            }
            Some(normalized.dice)
        }
        None => None,
    };

    let curve = if request.curve {
        Some(insertion.curve(&request.a, &request.b)?)
    } else {
        None
    };

    let output = InsertionOutput {
        c: insertion.die.values(),
        integral_c: insertion.integral().map(|die| die.into_values()),
        report: &insertion.report,
        normalized,
        curve,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_extension(dice: usize, sides: usize) -> Result<()> {
    let set = DiceCatalog::munoz_perera(sides)?;
    let path = DiceCatalog::munoz_perera_path(sides);
    let extension = CycleExtension::new(ExtensionConfig {
        max_dice: dice,
        ..ExtensionConfig::default()
    });
    let summary = extension.execute(&set, &path)?;
    let verification = CycleVerifier::verify(&summary.set, &summary.path, Orientation::Beats);
    println!("{}", summary.set);
    print!("{}", verification.explanation);
    info!(
        "Extended to {} dice in {} rounds ({} midpoint fallbacks) in {:?}",
        summary.set.len(),
        summary.stats.rounds,
        summary.stats.midpoint_fallbacks,
        summary.duration
    );
    if !verification.is_intransitive || summary.set.len() < dice {
        bail!(
            "Extension of {}-sided Munoz-Perera dice stopped at {} dice",
            sides,
            summary.set.len()
        );
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    info!("Searching intransitive cycles of the catalog dice");
    let mut sets: Vec<DiceSet> = DiceCatalog::names()
        .iter()
        .map(|name| DiceCatalog::by_name(name))
        .collect::<Result<_>>()?;
    sets.push(DiceCatalog::munoz_perera(6)?);
    sets.push(DiceCatalog::double_oskar()?);
    sets.push(DiceCatalog::munoz_perera_tuples(12, 6)?);
    for set in &sets {
        print_cycles(set);
    }

    info!("Checking Munoz-Perera paths of tuples of 6-sided dice");
    for dice in (12..=18).step_by(6) {
        let tuples = DiceCatalog::munoz_perera_tuples(dice, 6)?;
        let path = DiceCatalog::munoz_perera_path(dice);
        let result = CycleVerifier::verify(&tuples, &path, Orientation::Beats);
        println!("{}: path {} intransitive: {}", tuples.name, path, result.is_intransitive);
    }

    info!("Inserting dice between neighbours of known cycles");
    let search = ThresholdSearch::default();
    for set in [DiceCatalog::grime(), DiceCatalog::example_2()] {
        for (from, to) in DicePath::closed_sequence(set.len()).steps() {
            let (a, b) = (&set.dice()[from], &set.dice()[to]);
            let (a, b) = if set.probability(from, to).unwrap_or(0.0) > 0.5 {
                (a, b)
            } else {
                (b, a)
            };
            match search.insert(a, b) {
                Ok(insertion) => print_insertion(a, b, &insertion),
                Err(err) => warn!(
                    "{}: no die between D{:02} and D{:02}: {}",
                    set.name, from, to, err
                ),
            }
        }
    }

    info!("Extending intransitive cycles");
    let extension = CycleExtension::new(ExtensionConfig::default());
    for (set, path) in [
        (DiceCatalog::oskar(), DicePath::closed_sequence(7)),
        (DiceCatalog::grime(), DicePath::closed_sequence(5)),
        (DiceCatalog::munoz_perera(6)?, DiceCatalog::munoz_perera_path(6)),
    ] {
        let summary = extension.execute(&set, &path)?;
        let orientation = CycleVerifier::detect(&summary.set, &summary.path);
        println!("{}", summary.set);
        println!(
            "path {} intransitive: {}",
            summary.path,
            orientation.map_or_else(|| "no".to_string(), |o| o.to_string())
        );
    }
    info!("Examples completed");
    Ok(())
}

fn print_cycles(set: &DiceSet) {
    print!("{}", set);
    for orientation in [Orientation::Beats, Orientation::Loses] {
        let cycles = search_cycles(set, orientation, Some(MAX_PATHS));
        let limited = if cycles.len() >= MAX_PATHS { " (limit reached)" } else { "" };
        println!(
            "{} cycles ({}): {}{}",
            orientation,
            set.name,
            cycles.len(),
            limited
        );
        for cycle in cycles.iter().take(MAX_PATHS_TO_PRINT) {
            println!("  {}", cycle);
        }
        if cycles.len() > MAX_PATHS_TO_PRINT {
            println!("  ...");
        }
    }
    println!("P(Di > Dj):\n{}", set.dominance_matrix().render());
}

fn print_insertion(a: &[f64], b: &[f64], insertion: &Insertion) {
    let report = DominanceChecker::assess(a, b, &insertion.die);
    println!(
        "A = {:?}\nB = {:?}\nC = {}\n{}",
        a, b, insertion.die, report.explanation
    );
}
