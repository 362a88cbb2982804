//! Relevance scoring: fuzzy field matching, depth penalty, usage history.
//!
//! # Scoring Formula
//!
//! ```text
//! adjusted = best_field_score * max(floor, 1 - step * depth)
//! usage    = usage_count * max(0, decay_days - days_since_last_use)
//! len      = max(1, chars(query))
//! score    = usage / len + adjusted * len
//! ```
//!
//! Short queries are dominated by usage (fast recall of frequently used
//! entries), long ones by match quality. `depth` is the index of the field
//! that produced the best match: label 0, subtitle 1, searchable text 2,
//! then each category.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};
use std::sync::Arc;

use crate::config::ScoringConfig;
use crate::history::History;
use crate::presenter::WindowContext;
use crate::types::{Entry, MatchingPolicy};

/// Subsequence matcher with reusable scratch buffers.
///
/// Not `Sync`; each provider task creates its own.
pub struct FuzzyMatcher {
    matcher: Matcher,
    buf: Vec<char>,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            buf: Vec::new(),
        }
    }

    /// Compiles `query` into a case-insensitive pattern. Whitespace separates
    /// words that must all match; no special syntax is interpreted.
    pub fn pattern(query: &str) -> Pattern {
        Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        )
    }

    /// Raw match score of `pattern` against `haystack`; 0 means no match.
    pub fn score(&mut self, pattern: &Pattern, haystack: &str) -> f64 {
        if haystack.is_empty() {
            return 0.0;
        }
        let haystack = Utf32Str::new(haystack, &mut self.buf);
        pattern
            .score(haystack, &mut self.matcher)
            .map_or(0.0, f64::from)
    }
}

/// The best-matching field of an entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMatch {
    /// Raw matcher score.
    pub score: f64,
    /// Field index: label 0, subtitle 1, searchable 2, categories after.
    pub depth: usize,
}

/// Finds the highest-scoring field. Ties keep the shallower field.
pub fn best_field_match(
    entry: &Entry,
    pattern: &Pattern,
    matcher: &mut FuzzyMatcher,
) -> Option<FieldMatch> {
    let mut best: Option<FieldMatch> = None;
    for (depth, field) in entry.matchable_fields().enumerate() {
        let score = matcher.score(pattern, field);
        if score <= 0.0 {
            continue;
        }
        if best.is_none_or(|b| score > b.score) {
            best = Some(FieldMatch { score, depth });
        }
    }
    best
}

/// Multiplier applied to a match found at `depth`.
pub fn field_penalty(depth: usize, config: &ScoringConfig) -> f64 {
    (1.0 - config.field_penalty_step * depth as f64).max(config.field_penalty_floor)
}

/// Usage modifier: activation count weighted by recency.
pub fn usage_score(entry: &Entry, decay_days: u32) -> f64 {
    if entry.usage_count == 0 {
        return 0.0;
    }
    let remaining = decay_days.saturating_sub(entry.days_since_last_use);
    f64::from(entry.usage_count) * f64::from(remaining)
}

/// Blend usage and match quality by query length.
pub fn combine(usage: f64, adjusted: f64, query_len: usize) -> f64 {
    let len = query_len.max(1) as f64;
    usage / len + adjusted * len
}

/// Words of `query` an entry with `limit` may be matched against.
fn limited_query(query: &str, limit: usize) -> String {
    query.split_whitespace().take(limit).collect::<Vec<_>>().join(" ")
}

/// Clamp malformed scores (negative, NaN, infinite) to zero.
fn sanitize(score: f64, entry: &Entry) -> f64 {
    if score.is_finite() && score >= 0.0 {
        score
    } else {
        tracing::debug!(
            identifier = entry.identifier(),
            score,
            "clamping anomalous score to zero"
        );
        0.0
    }
}

/// Computes `final_score` for entries and merges history into them.
///
/// Shared by every provider task of a cycle; all state it reads is behind
/// `Arc`s that support concurrent reads.
pub struct Scorer {
    config: ScoringConfig,
    history: Arc<dyn History>,
    context: Option<Arc<dyn WindowContext>>,
}

impl Scorer {
    pub fn new(config: ScoringConfig, history: Arc<dyn History>) -> Self {
        Self {
            config,
            history,
            context: None,
        }
    }

    /// Fill `open_window_count` from a window tracker while scoring.
    pub fn with_window_context(mut self, context: Arc<dyn WindowContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Relevance of `entry` for `query`.
    ///
    /// Writes `fuzzy_score` and the usage fields of `entry` as a side effect
    /// but leaves `final_score` to the caller.
    pub fn score(&self, entry: &mut Entry, query: &str, matcher: &mut FuzzyMatcher) -> f64 {
        match entry.matching {
            MatchingPolicy::Fuzzy => self.score_fuzzy(entry, query, matcher),
            MatchingPolicy::AlwaysTop if entry.final_score > 0.0 => entry.final_score,
            MatchingPolicy::AlwaysTop => self.config.always_top_score,
            MatchingPolicy::AlwaysBottom if entry.final_score > 0.0 => entry.final_score,
            MatchingPolicy::AlwaysBottom => self.config.always_bottom_score,
            MatchingPolicy::Unknown => 0.0,
        }
    }

    fn score_fuzzy(&self, entry: &mut Entry, query: &str, matcher: &mut FuzzyMatcher) -> f64 {
        let query_len = query.chars().count();
        if query_len == 0 {
            return 1.0;
        }

        let pattern = FuzzyMatcher::pattern(query);
        let Some(best) = best_field_match(entry, &pattern, matcher) else {
            entry.fuzzy_score = 0.0;
            return 0.0;
        };

        let adjusted = best.score * field_penalty(best.depth, &self.config);
        entry.fuzzy_score = adjusted;

        self.merge_history(entry, query);
        let usage = usage_score(entry, self.config.usage_decay_days);
        combine(usage, adjusted, query_len)
    }

    /// Merges usage recorded under every key that is a prefix of `query`,
    /// the empty key included, keeping the most recent record.
    pub fn merge_history(&self, entry: &mut Entry, query: &str) {
        let boundaries = query
            .char_indices()
            .map(|(i, _)| i)
            .skip(1)
            .chain(std::iter::once(query.len()));
        for end in std::iter::once(0).chain(boundaries) {
            if let Some(record) = self.history.lookup(entry.identifier(), Some(&query[..end])) {
                entry.merge_history(&record);
            }
        }
    }

    fn apply_window_context(&self, entry: &mut Entry) {
        if let (Some(context), Some(class)) = (&self.context, entry.window_class.as_deref()) {
            entry.open_window_count = context.open_window_count(class);
        }
    }

    /// Scores one provider batch for `query` and drops entries that score zero.
    ///
    /// Provider-supplied scores are kept unless the entry asks for a
    /// recalculation.
    pub fn score_batch(&self, entries: Vec<Entry>, query: &str) -> Vec<Entry> {
        let mut matcher = FuzzyMatcher::new();
        let mut kept = Vec::with_capacity(entries.len());

        for mut entry in entries {
            if entry.recalculate_score {
                entry.final_score = 0.0;
                entry.fuzzy_score = 0.0;
            }

            if entry.final_score == 0.0 {
                let score = if entry.match_field_limit > 0 {
                    let limited = limited_query(query, entry.match_field_limit);
                    self.score(&mut entry, &limited, &mut matcher)
                } else {
                    self.score(&mut entry, query, &mut matcher)
                };
                entry.final_score = score;
            }
            entry.final_score = sanitize(entry.final_score, &entry);

            if entry.final_score == 0.0 {
                continue;
            }
            self.apply_window_context(&mut entry);
            kept.push(entry);
        }
        kept
    }

    /// Scores entries for the empty-query listing: usage only, no matching.
    ///
    /// Unused entries stay in the listing with a score of zero.
    pub fn rank_by_usage(&self, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .into_iter()
            .map(|mut entry| {
                if let Some(record) = self.history.lookup(entry.identifier(), None) {
                    entry.merge_history(&record);
                }
                entry.final_score = usage_score(&entry, self.config.usage_decay_days);
                self.apply_window_context(&mut entry);
                entry
            })
            .collect()
    }
}
