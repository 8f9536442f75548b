use anyhow::Result;
use dicecycle::{
    DiceCatalog, DiceSetLoader, DiceSetWriter, InsertionConfig, InsertionError, ThresholdSearch,
};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("dicecycle_{}_{}.json", name, epoch));
    path
}

#[test]
fn written_sets_load_back() -> Result<()> {
    let set = DiceCatalog::grime();
    let path = temp_path("grime");
    DiceSetWriter::write_to_path(&set, &path)?;
    let loaded = DiceSetLoader::load_from_path(&path)?;
    fs::remove_file(&path).ok();

    assert_eq!(loaded.name, set.name);
    assert_eq!(loaded.dice(), set.dice());
    assert_eq!(loaded.probability(0, 1), set.probability(0, 1));
    Ok(())
}

#[test]
fn request_file_drives_the_search() -> Result<()> {
    let path = temp_path("request");
    fs::write(
        &path,
        r#"{"a": [4, 4, 4, 4, 4], "b": [3, 3, 3, 3, 8], "config": {"high_margin": 2.0}, "scale": 2}"#,
    )?;
    let request = DiceSetLoader::load_request(&path)?;
    fs::remove_file(&path).ok();

    assert_eq!(
        request.config,
        InsertionConfig {
            high_margin: 2.0,
            ..InsertionConfig::default()
        }
    );
    assert_eq!(request.scale, Some(2.0));
    let insertion = ThresholdSearch::new(request.config).insert(&request.a, &request.b)?;
    assert_eq!(insertion.die.values(), &[2.0, 2.0, 3.500001, 10.0, 10.0]);
    Ok(())
}

#[test]
fn malformed_files_report_their_path() {
    let path = temp_path("broken");
    fs::write(&path, r#"{"name": "broken", "dice": [[1, "x"]]}"#).expect("write");
    let err = DiceSetLoader::load_from_path(&path).unwrap_err();
    fs::remove_file(&path).ok();
    assert!(format!("{:#}", err).contains("dicecycle_broken"));

    let missing = temp_path("missing");
    assert!(DiceSetLoader::load_request(&missing).is_err());
}

#[test]
fn empty_request_dice_are_rejected() {
    let path = temp_path("empty");
    fs::write(&path, r#"{"a": [], "b": [1]}"#).expect("write");
    let result = DiceSetLoader::load_request(&path);
    fs::remove_file(&path).ok();
    assert!(result.is_err());
}

#[test]
fn request_with_negative_margin_is_refused() -> Result<()> {
    let path = temp_path("negative_margin");
    fs::write(
        &path,
        r#"{"a": [4, 4, 4, 4, 4], "b": [3, 3, 3, 3, 8], "config": {"low_margin": -3.0}}"#,
    )?;
    let request = DiceSetLoader::load_request(&path)?;
    fs::remove_file(&path).ok();

    let err = ThresholdSearch::new(request.config)
        .insert(&request.a, &request.b)
        .unwrap_err();
    assert_eq!(
        err,
        InsertionError::InvalidConfig {
            field: "low_margin",
            value: -3.0
        }
    );
    Ok(())
}
