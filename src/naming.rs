//! Canonical display names for seasons and episodes.
//!
//! Names are never stored free-form: both the local scan and the remote read
//! derive them from the series name and the numeric position, so the same
//! position always yields the same name regardless of where it came from.

/// Name of a season, e.g. `"Dark - Season 2"`
pub fn season_name(series_name: &str, season_number: u32) -> String {
    format!("{} - Season {}", series_name, season_number)
}

/// Name of an episode, e.g. `"Dark S02E05"`
///
/// Numbers are zero padded to two digits; wider numbers are kept as-is.
pub fn episode_name(series_name: &str, season_number: u32, episode_number: u32) -> String {
    format!("{} S{:02}E{:02}", series_name, season_number, episode_number)
}
