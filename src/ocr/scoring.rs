//! Candidate scoring
//!
//! Chooses the best of several recognition outputs for one page.
//! No per-character confidence is available from the engine, so the
//! default scorer uses text length as a proxy for completeness.

/// Scores a recognition candidate; higher is better
pub trait TextScorer: Send + Sync {
    fn score(&self, text: &str) -> usize;
}

/// Longest trimmed text wins
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestText;

impl TextScorer for LongestText {
    fn score(&self, text: &str) -> usize {
        text.trim().chars().count()
    }
}

/// Pick the highest-scoring candidate.
///
/// Ties keep the earliest candidate. Returns an empty string when there
/// are no candidates.
pub fn select_best<I>(scorer: &dyn TextScorer, candidates: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut best: Option<(usize, String)> = None;

    for candidate in candidates {
        let score = scorer.score(&candidate);
        match &best {
            Some((best_score, _)) if score <= *best_score => {}
            _ => best = Some((score, candidate)),
        }
    }

    best.map(|(_, text)| text).unwrap_or_default()
}
