use async_trait::async_trait;
use std::collections::HashSet;

use super::LocationExtractor;

/// English stopwords, NLTK list.
pub static ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// Split on whitespace, strip edge punctuation per token, drop tokens whose
/// lowercase form is a stopword or that strip down to nothing. Order
/// preserved, no deduplication.
pub fn filter_stopwords(text: &str, stopwords: &HashSet<&str>) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|token| !token.is_empty())
        .filter(|token| !stopwords.contains(token.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// Treats every non-stopword token as a location candidate. Noisy, but it
/// never needs a network call.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    stopwords: HashSet<&'static str>,
}

impl KeywordExtractor {
    pub fn with_stopwords(stopwords: HashSet<&'static str>) -> Self {
        Self { stopwords }
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().copied().collect())
    }
}

#[async_trait]
impl LocationExtractor for KeywordExtractor {
    async fn extract(&self, text: &str) -> Vec<String> {
        filter_stopwords(text, &self.stopwords)
    }
}
