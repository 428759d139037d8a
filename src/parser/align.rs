//! Secondary track alignment
//!
//! Translation and romanization tracks are line-synced even when the original
//! is word-synced, and their timestamps rarely match the dynamic lines exactly.
//! Alignment happens in two steps:
//!
//! 1. `attach_original_lyric` copies the plain original text onto every
//!    secondary entry, by equal or nearest time.
//! 2. `attach_lyric_to_dynamic` uses that text to pick the dynamic line with
//!    the most similar content around the nearest timestamp.
//!
//! Plain lyrics use `attach_exact`, which only accepts identical timestamps.

use std::collections::HashSet;

use super::types::{LyricLine, PureLine, SecondaryField, push_joined};
use crate::settings::ParserSettings;
use crate::utils::edit_distance;

/// How original lines are matched onto a secondary track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Timestamps within the equal-match tolerance, last candidate wins
    Equal,
    /// Minimum time distance, first candidate wins
    Closest,
}

/// Choose the match mode from the share of secondary timestamps that also
/// occur in the original track
pub fn match_mode(secondary: &[PureLine], original: &[PureLine], closest_ratio: f64) -> MatchMode {
    let secondary_times: HashSet<u64> = secondary.iter().map(|l| l.time.to_bits()).collect();
    if secondary_times.is_empty() {
        return MatchMode::Equal;
    }
    let original_times: HashSet<u64> = original.iter().map(|l| l.time.to_bits()).collect();
    let shared = secondary_times.intersection(&original_times).count();

    if (shared as f64 / secondary_times.len() as f64) < closest_ratio {
        MatchMode::Closest
    } else {
        MatchMode::Equal
    }
}

fn find_target(lines: &[PureLine], time: f64, mode: MatchMode, tolerance: f64) -> Option<usize> {
    match mode {
        MatchMode::Equal => lines
            .iter()
            .rposition(|line| (line.time - time).abs() < tolerance),
        MatchMode::Closest => {
            let mut best: Option<(usize, f64)> = None;
            for (index, line) in lines.iter().enumerate() {
                let distance = (line.time - time).abs();
                if best.is_none_or(|(_, d)| d > distance) {
                    best = Some((index, distance));
                }
            }
            best.map(|(index, _)| index)
        }
    }
}

/// Attach plain original text to the entries of a secondary track
pub fn attach_original_lyric(
    mut lines: Vec<PureLine>,
    original: &[PureLine],
    settings: &ParserSettings,
) -> Vec<PureLine> {
    if lines.is_empty() {
        return lines;
    }

    let mode = match_mode(&lines, original, settings.closest_match_ratio);
    tracing::debug!(
        "Attaching {} original lines onto {} secondary lines ({:?})",
        original.len(),
        lines.len(),
        mode
    );

    for line in original {
        if let Some(index) = find_target(&lines, line.time, mode, settings.equal_match_tolerance_ms)
        {
            let target = lines[index].original_lyric.get_or_insert_with(String::new);
            push_joined(target, &line.lyric);
        }
    }

    lines
}

/// Nearest dynamic line by time, first wins ties
fn nearest_index(dynamic: &[LyricLine], time: f64) -> usize {
    let mut target = 0;
    for (index, line) in dynamic.iter().enumerate() {
        if (dynamic[target].time - time).abs() > (line.time - time).abs() {
            target = index;
        }
    }
    target
}

/// Candidate indexes around `center`, farthest first and `center` last
fn search_window(center: usize, window: usize, len: usize) -> Vec<usize> {
    let mut sequence = vec![center];
    for offset in 1..=window {
        if let Some(before) = center.checked_sub(offset) {
            sequence.push(before);
        }
        if center + offset < len {
            sequence.push(center + offset);
        }
    }
    sequence.reverse();
    sequence
}

/// Attach a secondary track to the most similar nearby dynamic line
///
/// The search only looks `dynamic_search_window` lines around the nearest
/// timestamp, so a large time gap between tracks can miss the best match.
pub fn attach_lyric_to_dynamic(
    mut dynamic: Vec<LyricLine>,
    lines: &[PureLine],
    field: SecondaryField,
    settings: &ParserSettings,
) -> Vec<LyricLine> {
    if dynamic.is_empty() {
        return dynamic;
    }

    for line in lines {
        let center = nearest_index(&dynamic, line.time);
        let original = line.original_lyric.as_deref().unwrap_or("");

        let mut target = center;
        let mut min_cost = usize::MAX;
        for index in search_window(center, settings.dynamic_search_window, dynamic.len()) {
            let candidate = &dynamic[index].content;
            let occupied = usize::from(candidate.field(field).is_some());
            let cost = edit_distance(original, &candidate.original) * 1000 + occupied;
            // Later candidates are nearer, so they win ties
            if cost <= min_cost {
                min_cost = cost;
                target = index;
            }
        }

        dynamic[target].content.append_field(field, &line.lyric);
    }

    dynamic
}

/// Attach secondary lines to plain lines with the exact same timestamp
pub fn attach_exact(
    mut target: Vec<LyricLine>,
    lines: &[PureLine],
    field: SecondaryField,
) -> Vec<LyricLine> {
    for line in lines {
        if let Some(found) = target.iter_mut().find(|t| t.time == line.time) {
            found.content.set_field(field, line.lyric.as_str());
        }
    }
    target
}
