// Corpus loading.
//
// Two on-disk forms:
// - `.json`: an array of chord symbol strings
// - anything else: whitespace-separated symbols, `#` starts a comment line
//
// Symbols are kept verbatim; nothing is parsed or validated here. An empty
// result is not an error at this layer, the session builder reports it as
// `EmptyVocabulary`.

use crate::error::{Error, Result};
use std::path::Path;
use tracing::info;

/// Read a corpus file, choosing the format from the extension.
pub fn load_corpus(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let symbols = if is_json {
        serde_json::from_str::<Vec<String>>(&data).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        parse_tokens(&data)
    };

    info!(path = %path.display(), symbols = symbols.len(), "corpus loaded");
    Ok(symbols)
}

/// Split plain-text corpus data into symbols.
pub fn parse_tokens(data: &str) -> Vec<String> {
    data.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}
