use anyhow::{Context, Result};
use chrono::Utc;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated seed list. Accepts decimal or `0x`-prefixed hex.
pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            let parsed = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .map_or_else(|| token.parse::<u64>(), |hex| u64::from_str_radix(hex, 16));
            parsed.with_context(|| format!("invalid seed `{token}`"))
        })
        .collect()
}

/// Save key for one (strategy, seed) session.
pub fn session_key(strategy: &str, seed: u64) -> String {
    format!("{strategy}-seed-{seed}")
}

pub fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
