use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dice::model::{DiceSet, Distribution};
use crate::insertion::InsertionConfig;

/// Reads dice sets and insertion requests from JSON files.
pub struct DiceSetLoader;

impl DiceSetLoader {
    pub fn from_json_str(json: &str) -> Result<DiceSet> {
        let set: DiceSet = serde_json::from_str(json).context("parse dice set json")?;
        validate_set(&set)?;
        Ok(set)
    }

    pub fn load_from_path(path: &Path) -> Result<DiceSet> {
        let set: DiceSet = read_json(path)?;
        validate_set(&set).with_context(|| format!("validate dice set {:?}", path))?;
        Ok(set)
    }

    pub fn load_request(path: &Path) -> Result<InsertionRequest> {
        let request: InsertionRequest = read_json(path)?;
        if request.a.is_empty() || request.b.is_empty() {
            bail!("Insertion request {:?} needs non-empty dice 'a' and 'b'", path);
        }
        Ok(request)
    }
}

/// Writes dice sets in the format accepted by [`DiceSetLoader`].
pub struct DiceSetWriter;

impl DiceSetWriter {
    pub fn to_json_string(set: &DiceSet) -> Result<String> {
        Ok(serde_json::to_string_pretty(set)?)
    }

    pub fn write_to_path(set: &DiceSet, path: &Path) -> Result<()> {
        write_json(path, set)
    }
}

/// Two dice with A beating B, plus optional search settings and the scale
/// factor used to normalise the resulting triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionRequest {
    pub a: Distribution,
    pub b: Distribution,
    #[serde(default)]
    pub config: InsertionConfig,
    #[serde(default)]
    pub scale: Option<f64>,
    /// Include sampled CDF and survival curves of A, B and C in the output.
    #[serde(default)]
    pub curve: bool,
}

fn validate_set(set: &DiceSet) -> Result<()> {
    if set.is_empty() {
        bail!("Dice set '{}' contains no dice", set.name);
    }
    if let Some(idx) = set.dice().iter().position(|die| die.is_empty()) {
        bail!("Die {} of set '{}' has no faces", idx, set.name);
    }
    Ok(())
}

pub(crate) fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).with_context(|| format!("open json file {:?}", path))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).with_context(|| format!("deserialize json file {:?}", path))
}

pub(crate) fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent directory {:?}", parent))?;
        }
    }
    let file = File::create(path).with_context(|| format!("create json file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("serialize json file {:?}", path))?;
    writer.flush().with_context(|| format!("flush json file {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dice_set() {
        let set = DiceSetLoader::from_json_str(r#"{"name": "pair", "dice": [[1, 4], [2, 3.5]]}"#)
            .expect("parse");
        assert_eq!(set.name, "pair");
        assert_eq!(set.len(), 2);
        assert_eq!(set.dice()[1].values(), &[2.0, 3.5]);
    }

    #[test]
    fn rejects_empty_dice() {
        assert!(DiceSetLoader::from_json_str(r#"{"name": "none", "dice": []}"#).is_err());
        assert!(DiceSetLoader::from_json_str(r#"{"name": "bad", "dice": [[1], []]}"#).is_err());
    }

    #[test]
    fn request_defaults_config() {
        let request: InsertionRequest =
            serde_json::from_str(r#"{"a": [4, 4], "b": [3, 5]}"#).expect("request");
        assert_eq!(request.config, InsertionConfig::default());
        assert!(request.scale.is_none());
        assert!(!request.curve);
    }
}
