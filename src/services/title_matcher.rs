use strsim::normalized_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Default minimum score (0-100) for a fuzzy title match to count.
pub const DEFAULT_MATCH_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    /// Row index of the matched title in the catalog.
    pub index: usize,
    pub title: String,
    /// Match confidence, 0-100.
    pub score: u8,
}

/// Fuzzy resolution of a free-text title against the catalog's titles.
/// Scores combine character-level and token-level similarity; ties break to
/// the lowest catalog index so results are deterministic across runs.
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    threshold: u8,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl TitleMatcher {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Find the single best match for `query` among `titles`. Returns `None`
    /// when the best score falls below the threshold; callers must treat
    /// that as a failed lookup rather than accepting a low-confidence match.
    pub fn resolve<'a, I>(&self, query: &str, titles: I) -> Option<TitleMatch>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let query_norm = normalize(query);
        let query_sorted = token_sort(&query_norm);

        let mut best: Option<TitleMatch> = None;
        for (index, title) in titles.into_iter().enumerate() {
            let candidate_norm = normalize(title);
            let candidate_sorted = token_sort(&candidate_norm);

            let char_score = normalized_levenshtein(&query_norm, &candidate_norm);
            let token_score = normalized_levenshtein(&query_sorted, &candidate_sorted);
            let score = (char_score.max(token_score) * 100.0).round() as u8;

            // Strictly-greater keeps the earliest index on ties.
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(TitleMatch {
                    index,
                    title: title.to_string(),
                    score,
                });
            }
        }

        best.filter(|m| m.score >= self.threshold)
    }
}

fn normalize(text: &str) -> String {
    text.trim().nfkc().collect::<String>().to_lowercase()
}

/// Whitespace tokens in sorted order, so word-order differences do not
/// penalize the score.
fn token_sort(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLES: [&str; 4] = ["The Matrix", "The Matrix Reloaded", "Inception", "Jaws"];

    #[test]
    fn exact_title_matches_with_full_confidence() {
        let matcher = TitleMatcher::default();
        let m = matcher.resolve("The Matrix", TITLES.iter().copied()).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.score, 100);
    }

    #[test]
    fn matching_ignores_case_and_word_order() {
        let matcher = TitleMatcher::default();
        let m = matcher.resolve("matrix the", TITLES.iter().copied()).unwrap();
        assert_eq!(m.title, "The Matrix");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn close_misspelling_still_resolves() {
        let matcher = TitleMatcher::default();
        let m = matcher.resolve("The Matrx", TITLES.iter().copied()).unwrap();
        assert_eq!(m.index, 0);
        assert!(m.score >= 80);
    }

    #[test]
    fn nonsense_query_is_rejected_by_threshold() {
        let matcher = TitleMatcher::default();
        assert!(matcher
            .resolve("Xyzzyxq Nonexistent Film", TITLES.iter().copied())
            .is_none());
    }

    #[test]
    fn equal_scores_resolve_to_lowest_catalog_index() {
        let matcher = TitleMatcher::new(50);
        let duplicated = ["Twin Title", "Twin Title"];
        let m = matcher.resolve("Twin Title", duplicated.iter().copied()).unwrap();
        assert_eq!(m.index, 0);
    }

    #[test]
    fn empty_title_list_yields_no_match() {
        let matcher = TitleMatcher::default();
        assert!(matcher.resolve("Anything", std::iter::empty()).is_none());
    }
}
