use std::collections::HashMap;
use webbrief_core::{Result, Summarizer};

/// Frequency-ranking extractive summarizer: the always-available local
/// backend used when no external summarization service is configured.
///
/// Sentences are scored by the summed corpus-wide frequency of their word
/// tokens and the top `max_sentences` are returned in ranked order. Ties
/// keep original sentence position (stable sort), so output is
/// deterministic for a given input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencySummarizer;

impl FrequencySummarizer {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize_text(text: &str, max_sentences: usize) -> String {
        let sentences = split_sentences(text);

        let mut freq: HashMap<String, u64> = HashMap::new();
        for sentence in &sentences {
            for token in word_tokens(sentence) {
                *freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(u64, &str)> = sentences
            .iter()
            .map(|sentence| {
                let score = word_tokens(sentence)
                    .map(|t| freq.get(&t).copied().unwrap_or(0))
                    .sum();
                (score, *sentence)
            })
            .collect();
        // Stable sort: equal scores keep original sentence order.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        ranked
            .iter()
            .take(max_sentences)
            .map(|(_, s)| *s)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait::async_trait]
impl Summarizer for FrequencySummarizer {
    fn name(&self) -> &'static str {
        "frequency"
    }

    async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String> {
        Ok(Self::summarize_text(text, max_sentences))
    }
}

/// Split at each `.` / `!` / `?` that is immediately followed by whitespace;
/// the terminator and the whitespace run are consumed by the split. Empty
/// candidates are kept (they rank last with score 0 and cost nothing).
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();
    while let Some((i, ch)) = iter.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let followed_by_ws = matches!(iter.peek(), Some(&(_, next)) if next.is_whitespace());
        if !followed_by_ws {
            continue;
        }
        out.push(&text[start..i]);
        start = text.len();
        while let Some(&(j, c)) = iter.peek() {
            if c.is_whitespace() {
                iter.next();
            } else {
                start = j;
                break;
            }
        }
    }
    out.push(&text[start..]);
    out
}

/// Lowercase word tokens: maximal runs of alphanumeric characters or `_`.
fn word_tokens(s: &str) -> impl Iterator<Item = String> + '_ {
    let mut chars = s.chars().peekable();
    std::iter::from_fn(move || {
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                break;
            }
            chars.next();
        }
        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                token.extend(c.to_lowercase());
                chars.next();
            } else {
                break;
            }
        }
        (!token.is_empty()).then_some(token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summarize(text: &str, n: usize) -> String {
        FrequencySummarizer::summarize_text(text, n)
    }

    #[test]
    fn empty_text_summarizes_to_empty_for_any_cap() {
        assert_eq!(summarize("", 0), "");
        assert_eq!(summarize("", 1), "");
        assert_eq!(summarize("", 100), "");
    }

    #[test]
    fn zero_sentence_cap_yields_empty_output() {
        assert_eq!(summarize("One. Two. Three.", 0), "");
    }

    #[test]
    fn large_cap_returns_all_sentences_in_ranked_order() {
        // "a" occurs twice, so the second sentence outscores the first.
        let out = summarize("b c. a a.", 10);
        assert_eq!(out, "a a. b c");
    }

    #[test]
    fn highest_frequency_overlap_sentence_wins() {
        // Scores by summed token frequency:
        //   "Cats are great"            -> 2 + 3 + 2     = 7
        //   "Dogs are great too"        -> 2 + 3 + 2 + 1 = 8
        //   "Cats and dogs are pets."   -> 2 + 1 + 2 + 3 + 1 = 9
        let text = "Cats are great. Dogs are great too. Cats and dogs are pets.";
        assert_eq!(summarize(text, 1), "Cats and dogs are pets.");
        assert_eq!(
            summarize(text, 3),
            "Cats and dogs are pets. Dogs are great too Cats are great"
        );
    }

    #[test]
    fn equal_scores_keep_original_sentence_order() {
        // Every token is unique, so both sentences score 2.
        assert_eq!(summarize("Aa bb. Cc dd.", 2), "Aa bb Cc dd.");
    }

    #[test]
    fn duplicate_tokens_count_toward_the_score_each_time() {
        // "echo echo" scores 2 + 2 = 4; "alpha beta" scores 1 + 1 = 2.
        assert_eq!(summarize("alpha beta. echo echo.", 1), "echo echo.");
    }

    #[test]
    fn terminator_without_trailing_whitespace_does_not_split() {
        // "1.5" and "v1.2" stay inside one sentence candidate.
        let out = summarize("Version v1.2 shipped 1.5 days ago", 10);
        assert_eq!(out, "Version v1.2 shipped 1.5 days ago");
    }

    #[test]
    fn split_keeps_empty_candidates() {
        assert_eq!(split_sentences("a. . b"), vec!["a", "", "b"]);
        assert_eq!(split_sentences("a. "), vec!["a", ""]);
        assert_eq!(split_sentences(""), vec![""]);
    }

    #[test]
    fn tokens_are_lowercased_word_runs() {
        let toks: Vec<String> = word_tokens("Hello, World_2 — naïve!").collect();
        assert_eq!(toks, vec!["hello", "world_2", "naïve"]);
    }

    proptest! {
        #[test]
        fn summarize_is_deterministic(text in any::<String>(), n in 0usize..8) {
            prop_assert_eq!(summarize(&text, n), summarize(&text, n));
        }

        #[test]
        fn summarize_never_panics(text in any::<String>(), n in 0usize..1000) {
            let _ = summarize(&text, n);
        }
    }
}
