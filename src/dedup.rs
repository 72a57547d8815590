//! Title and content based de-duplication.
//!
//! An article is a duplicate when an earlier accepted article has the same
//! normalized title or the same content hash. Two accepted articles never
//! share a normalized title, so the near-identical-content rule for
//! same-title pairs (word-set Jaccard of 0.8 or more) is covered by the title
//! check and keeps no state of its own.
//! The first occurrence wins, so input order is part of the contract.

use crate::models::Article;
use crate::utils::{collapse_whitespace, normalize_title};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, info};

/// SHA-256 (hex) of lowercased, whitespace-collapsed content.
pub fn content_hash(content: &str) -> String {
    let normalized = collapse_whitespace(&content.to_lowercase());
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Run-scoped duplicate tracker.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen_titles: HashSet<String>,
    seen_hashes: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records the article when it is not a duplicate.
    pub fn add(&mut self, article: &Article) -> bool {
        let title = normalize_title(&article.title);
        let hash = content_hash(&article.content);

        if self.seen_titles.contains(&title) || self.seen_hashes.contains(&hash) {
            return false;
        }
        self.seen_titles.insert(title);
        self.seen_hashes.insert(hash);
        true
    }
}

/// Filter `articles` through a fresh [`Deduplicator`], keeping order.
pub fn remove_duplicates(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let mut dedup = Deduplicator::new();
    let unique: Vec<Article> = articles
        .into_iter()
        .filter(|article| {
            let keep = dedup.add(article);
            if !keep {
                debug!(title = %article.title, url = %article.url, "Skipped duplicate article");
            }
            keep
        })
        .collect();
    info!(before, after = unique.len(), "Deduplication complete");
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::article;

    /// Jaccard coefficient of the lowercased whitespace-token sets.
    fn jaccard_similarity(a: &str, b: &str) -> f64 {
        let lower_a = a.to_lowercase();
        let lower_b = b.to_lowercase();
        let words_a: HashSet<&str> = lower_a.split_whitespace().collect();
        let words_b: HashSet<&str> = lower_b.split_whitespace().collect();
        if words_a.is_empty() || words_b.is_empty() {
            return 0.0;
        }
        let shared = words_a.intersection(&words_b).count();
        shared as f64 / words_a.union(&words_b).count() as f64
    }

    const BODY_A: &str = "Stocks rallied on Monday as investors cheered strong earnings from big tech companies and a cooling inflation report";
    const BODY_B: &str = "Oil prices slid for a third straight session after OPEC signaled it would keep output steady through the winter months";

    #[test]
    fn test_same_title_different_url_keeps_first() {
        let first = article("Stocks rally on earnings", BODY_A, "https://www.cnn.com/a", "CNN");
        let second = article("  STOCKS rally   on earnings ", BODY_B, "https://www.cnbc.com/b", "CNBC");
        let unique = remove_duplicates(vec![first.clone(), second]);
        assert_eq!(unique, vec![first]);
    }

    #[test]
    fn test_same_content_different_title_is_duplicate() {
        let first = article("Stocks rally on earnings", BODY_A, "https://www.cnn.com/a", "CNN");
        let second = article(
            "Wall Street climbs",
            &BODY_A.to_uppercase().replace(' ', "  "),
            "https://www.cnbc.com/b",
            "CNBC",
        );
        let unique = remove_duplicates(vec![first, second]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].source, "CNN");
    }

    #[test]
    fn test_distinct_articles_kept_in_order() {
        let a = article("Stocks rally on earnings", BODY_A, "https://www.cnn.com/a", "CNN");
        let b = article("Oil slides again", BODY_B, "https://www.cnbc.com/b", "CNBC");
        let unique = remove_duplicates(vec![a.clone(), b.clone()]);
        assert_eq!(unique, vec![a, b]);
    }

    #[test]
    fn test_dedup_is_a_fixed_point() {
        let input = vec![
            article("Stocks rally on earnings", BODY_A, "https://www.cnn.com/a", "CNN"),
            article("Oil slides again", BODY_B, "https://www.cnbc.com/b", "CNBC"),
            article("stocks rally on earnings", BODY_B, "https://www.cnbc.com/c", "CNBC"),
            article("Different title", BODY_A, "https://www.cnbc.com/d", "CNBC"),
        ];
        let once = remove_duplicates(input);
        let twice = remove_duplicates(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_output_titles_distinct_and_same_title_pairs_dissimilar() {
        let input = vec![
            article("Fed holds", BODY_A, "https://a.com/1", "CNN"),
            article("fed  holds", BODY_B, "https://a.com/2", "CNN"),
            article("Jobs report", BODY_B, "https://a.com/3", "CNBC"),
        ];
        let unique = remove_duplicates(input);
        for (i, x) in unique.iter().enumerate() {
            for y in unique.iter().skip(i + 1) {
                assert_ne!(normalize_title(&x.title), normalize_title(&y.title));
            }
        }
    }

    #[test]
    fn test_same_title_near_identical_content_rejected_by_title() {
        let near = format!("{BODY_A} today");
        assert!(jaccard_similarity(BODY_A, &near) >= 0.8);
        assert_ne!(content_hash(BODY_A), content_hash(&near));

        let mut dedup = Deduplicator::new();
        assert!(dedup.add(&article("Stocks rally on earnings", BODY_A, "https://www.cnn.com/a", "CNN")));
        assert!(!dedup.add(&article("Stocks rally on earnings", &near, "https://www.cnbc.com/b", "CNBC")));
        assert_eq!(dedup.seen_titles.len(), 1);
        assert_eq!(dedup.seen_hashes.len(), 1);
    }

    #[test]
    fn test_add_records_state() {
        let mut dedup = Deduplicator::new();
        let a = article("Stocks rally on earnings", BODY_A, "https://www.cnn.com/a", "CNN");
        assert!(dedup.add(&a));
        assert!(!dedup.add(&a));
        assert!(dedup.seen_titles.contains("stocks rally on earnings"));
        assert_eq!(dedup.seen_hashes.len(), 1);
    }

    #[test]
    fn test_jaccard_similarity() {
        assert_eq!(jaccard_similarity("a b c d", "a b c d"), 1.0);
        assert_eq!(jaccard_similarity("a b", "c d"), 0.0);
        assert_eq!(jaccard_similarity("A b c d", "a b c e"), 3.0 / 5.0);
        assert_eq!(jaccard_similarity("", "a b"), 0.0);
    }

    #[test]
    fn test_content_hash_normalizes() {
        assert_eq!(content_hash("Hello   World"), content_hash("hello world\n"));
        assert_ne!(content_hash("hello world"), content_hash("hello there"));
    }
}
