//! Deterministic cleanup of raw route descriptions into token lists.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref DIGITS: Regex = Regex::new(r"[0-9]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Drop whitespace-delimited words that are stopwords, before any
/// punctuation stripping. Apostrophe forms like "don't" only match here.
fn remove_stopwords(text: &str) -> String {
    text.split_whitespace()
        .filter(|w| !is_stopword(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace hyphens flanked by word characters with a space, so compounds
/// like "dead-point" split into two tokens. Leading and trailing hyphens
/// are left alone and fall to the punctuation strip instead.
fn split_compound_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let between_words = c == '-'
            && i > 0
            && is_word_char(chars[i - 1])
            && chars.get(i + 1).map(|&n| is_word_char(n)).unwrap_or(false);
        out.push(if between_words { ' ' } else { c });
    }
    out
}

/// Keep only alphabetic characters and whitespace.
fn strip_specials(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect()
}

/// Normalize a raw description into lowercase alphabetic tokens.
///
/// Applies, in order: lowercasing, stopword removal, whitespace collapse,
/// digit removal, compound-hyphen splitting, punctuation strip, and a final
/// split that keeps only multi-character non-stopword tokens. Applying
/// `normalize` to the joined output of a previous `normalize` call yields
/// the same tokens.
pub fn normalize(raw: &str) -> Vec<String> {
    let text = raw.to_lowercase();
    let text = remove_stopwords(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = DIGITS.replace_all(&text, "");
    let text = split_compound_hyphens(&text);
    let text = strip_specials(&text);
    text.split_whitespace()
        .filter(|t| t.chars().count() > 1 && !is_stopword(t))
        .map(str::to_string)
        .collect()
}
