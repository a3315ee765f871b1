use std::collections::BTreeMap;
use std::fs;

use camino::Utf8Path;

pub const PYVENV_CFG: &str = "pyvenv.cfg";

/// Parses `key = value` lines; lines without `=` are ignored.
pub fn parse_pyvenv_cfg(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Display prompt recorded in a venv's `pyvenv.cfg`, if any.
pub fn read_prompt(venv_dir: &Utf8Path) -> Option<String> {
    let contents = fs::read_to_string(venv_dir.join(PYVENV_CFG)).ok()?;
    let prompt = parse_pyvenv_cfg(&contents).remove("prompt")?;
    let prompt = strip_wrapping_quotes(&prompt);
    (!prompt.is_empty()).then(|| prompt.to_string())
}

fn strip_wrapping_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
