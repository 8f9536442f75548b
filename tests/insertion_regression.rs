use anyhow::Result;
use dicecycle::{
    insert_three_level, probability_to_beat, DominanceChecker, InsertionConfig, InsertionError,
    Normalizer, ThresholdSearch,
};

fn regression_pairs() -> Vec<(Vec<f64>, Vec<f64>)> {
    let pairs: [(&[i64], &[i64]); 12] = [
        (&[2, 19, 22, 23, 29, 30], &[9, 16, 16, 19, 31, 38]),
        (&[6, 11, 16, 21, 26, 31], &[5, 10, 15, 20, 25, 36]),
        (&[5, 10, 15, 20, 25, 36], &[4, 9, 14, 19, 30, 35]),
        (&[4, 9, 14, 19, 30, 35], &[3, 8, 13, 24, 29, 34]),
        (&[3, 8, 13, 24, 29, 34], &[2, 7, 18, 23, 28, 33]),
        (&[2, 7, 18, 23, 28, 33], &[1, 12, 17, 22, 27, 32]),
        (&[1, 12, 17, 22, 27, 32], &[6, 11, 16, 21, 26, 31]),
        (&[4, 4, 4, 4, 4], &[3, 3, 3, 3, 8]),
        (&[3, 3, 3, 3, 8], &[2, 2, 2, 7, 7]),
        (&[2, 2, 2, 7, 7], &[1, 1, 6, 6, 6]),
        (&[1, 1, 6, 6, 6], &[0, 5, 5, 5, 5]),
        (&[0, 5, 5, 5, 5], &[4, 4, 4, 4, 4]),
    ];
    pairs
        .iter()
        .map(|(a, b)| {
            (
                a.iter().map(|&v| v as f64).collect(),
                b.iter().map(|&v| v as f64).collect(),
            )
        })
        .collect()
}

#[test]
fn every_regression_pair_accepts_an_insert() -> Result<()> {
    for (a, b) in regression_pairs() {
        let insertion = insert_three_level(&a, &b)?;
        assert_eq!(insertion.die.len(), a.len());

        let report = DominanceChecker::assess(&a, &b, &insertion.die);
        assert!(
            report.is_intransitive_insert,
            "A={:?} B={:?}\n{}",
            a,
            b,
            report.explanation
        );
        assert_eq!(report.p_ac, insertion.report.p_ac);
        assert_eq!(report.p_cb, insertion.report.p_cb);
    }
    Ok(())
}

#[test]
fn normalized_triples_stay_intransitive() -> Result<()> {
    for (a, b) in regression_pairs() {
        let insertion = insert_three_level(&a, &b)?;
        let triple = [a.as_slice(), b.as_slice(), insertion.die.values()];
        let normalized = Normalizer::normalize(&triple, 2.0)?;

        let min = normalized.dice.iter().flatten().copied().min();
        assert_eq!(min, Some(1));
        let dice = normalized.to_distributions();
        let report = DominanceChecker::assess(&dice[0], &dice[1], &dice[2]);
        assert!(report.is_intransitive_insert, "{}", report.explanation);
    }
    Ok(())
}

#[test]
fn integral_variant_needs_room_between_brackets() -> Result<()> {
    let mut snapped = 0;
    for (a, b) in regression_pairs() {
        if insert_three_level(&a, &b)?.integral().is_some() {
            snapped += 1;
        }
    }
    // Only the first pair has a gap wider than one around its threshold.
    assert_eq!(snapped, 1);

    for (a, b) in regression_pairs() {
        let a: Vec<f64> = a.iter().map(|v| 2.0 * v).collect();
        let b: Vec<f64> = b.iter().map(|v| 2.0 * v).collect();
        let insertion = insert_three_level(&a, &b)?;
        let integral = insertion.integral().expect("doubled values leave room");
        assert!(integral.is_integral());
        assert_eq!(probability_to_beat(&a, &integral), insertion.report.p_ac);
        assert_eq!(probability_to_beat(&integral, &b), insertion.report.p_cb);
    }
    Ok(())
}

#[test]
fn munoz_perera_neighbours_use_upper_levels() -> Result<()> {
    let a = [6.0, 11.0, 16.0, 21.0, 26.0, 31.0];
    let b = [5.0, 10.0, 15.0, 20.0, 25.0, 36.0];
    let insertion = insert_three_level(&a, &b)?;
    assert_eq!(insertion.report.threshold, 10.5);
    assert_eq!(insertion.report.split.low, 0);
    assert_eq!(insertion.report.split.middle, 4);
    assert_eq!(insertion.report.split.high, 2);
    assert_eq!(insertion.report.levels.high, 37.0);
    assert!((insertion.report.p_ac - 5.0 / 9.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn scenario_with_spread_values() -> Result<()> {
    let a = [2.0, 19.0, 22.0, 23.0, 29.0, 30.0];
    let b = [9.0, 16.0, 16.0, 19.0, 31.0, 38.0];
    assert!((probability_to_beat(&a, &b) - 21.0 / 36.0).abs() < 1e-12);
    let insertion = insert_three_level(&a, &b)?;
    assert_eq!(insertion.report.threshold, 17.5);
    assert_eq!(
        insertion.die.values(),
        &[1.0, 17.500001, 17.500001, 17.500001, 39.0, 39.0]
    );
    Ok(())
}

#[test]
fn reversed_pair_is_rejected_before_search() {
    let a = [3.0, 3.0, 3.0, 3.0, 8.0];
    let b = [4.0, 4.0, 4.0, 4.0, 4.0];
    match insert_three_level(&a, &b) {
        Err(InsertionError::InvalidInput { probability }) => {
            assert!((probability - 0.2).abs() < 1e-12)
        }
        other => panic!("expected invalid input, got {:?}", other),
    }
}

#[test]
fn wider_margins_move_outer_levels() -> Result<()> {
    let search = ThresholdSearch::new(InsertionConfig {
        low_margin: 5.0,
        high_margin: 10.0,
        ..InsertionConfig::default()
    });
    let a = [4.0, 4.0, 4.0, 4.0, 4.0];
    let b = [3.0, 3.0, 3.0, 3.0, 8.0];
    let insertion = search.insert(&a, &b)?;
    assert_eq!(insertion.report.levels.low, -2.0);
    assert_eq!(insertion.report.levels.high, 18.0);
    assert_eq!(insertion.report.split, insert_three_level(&a, &b)?.report.split);
    Ok(())
}
