//! Input batch loading
//!
//! Accepts the JSON produced by the upload form (`{"goods": [...]}`) or a
//! bare array of entries. Entries may use the English keys `brand`/`code`
//! or the Russian sheet headers `Бренд`/`Код`, and codes may be numbers.
//! A code cell listing several codes separated by `/` becomes one
//! [`InputItem`] per code. Brands are normalized on load.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{InputItem, normalize_optional_brand};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read input file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input contains no usable items")]
    EmptyBatch,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Envelope { goods: Vec<RawGood> },
    Bare(Vec<RawGood>),
}

/// One entry; English and Russian keys may both be present.
#[derive(Debug, Deserialize)]
struct RawGood {
    #[serde(default, deserialize_with = "lenient_string")]
    brand: Option<String>,
    #[serde(default, rename = "Бренд", deserialize_with = "lenient_string")]
    brand_ru: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    code: Option<String>,
    #[serde(default, rename = "Код", deserialize_with = "lenient_string")]
    code_ru: Option<String>,
}

impl RawGood {
    fn brand(&self) -> Option<&str> {
        first_non_empty(self.brand.as_deref(), self.brand_ru.as_deref())
    }

    fn code(&self) -> Option<&str> {
        first_non_empty(self.code.as_deref(), self.code_ru.as_deref())
    }
}

/// English value unless it is missing or empty, then the Russian one
fn first_non_empty<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    primary.filter(|value| !value.is_empty()).or(fallback)
}

/// Accept strings, numbers or null where a string is expected
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Split a `/`-delimited code cell into trimmed, non-empty codes
pub fn split_codes(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('/').map(str::trim).filter(|code| !code.is_empty())
}

/// Parse an input document into a flat batch of items.
pub fn parse_input(json: &str) -> Result<Vec<InputItem>, InputError> {
    let goods = match serde_json::from_str::<InputDocument>(json)? {
        InputDocument::Envelope { goods } | InputDocument::Bare(goods) => goods,
    };

    let mut items = Vec::with_capacity(goods.len());
    for (index, good) in goods.into_iter().enumerate() {
        let brand = normalize_optional_brand(good.brand());
        let code = good.code().unwrap_or_default();

        let before = items.len();
        items.extend(split_codes(code).map(|code| InputItem::new(brand.clone(), code)));
        if items.len() == before {
            warn!("Skipping entry {} (brand {:?}): no code", index, brand);
        }
    }

    if items.is_empty() {
        return Err(InputError::EmptyBatch);
    }
    Ok(items)
}

/// Read and parse an input file.
pub async fn load_input_file(path: &Path) -> Result<Vec<InputItem>, InputError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let items = parse_input(&content)?;
    info!("Loaded {} items from {:?}", items.len(), path);
    Ok(items)
}
