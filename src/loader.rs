use std::fs;

use anyhow::Context;
use serde::Deserialize;

use crate::models::NewWord;

/// One NDJSON line of the bundled dictionary, with the short field names the
/// original word list uses: w = headword, p = numbered pinyin, d = Russian
/// glosses, h = HSK level.
#[derive(Deserialize)]
struct DictLine {
    w: String,
    #[serde(default)]
    p: String,
    #[serde(default)]
    d: Vec<String>,
    #[serde(default)]
    h: u8,
}

/// Reads a one-object-per-line dictionary file. Unparseable lines are
/// skipped with a warning rather than failing the whole load.
pub fn load_ndjson(path: &str) -> anyhow::Result<Vec<NewWord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read dictionary file {}", path))?;

    let mut words = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DictLine>(line) {
            Ok(entry) => words.push(NewWord {
                chinese: entry.w,
                pinyin_numbered: entry.p,
                definitions: entry.d,
                hsk_level: entry.h,
                dictionary_id: None,
            }),
            Err(e) => {
                log::warn!("Skipping dictionary line {}: {}", line_no + 1, e);
            }
        }
    }

    Ok(words)
}
