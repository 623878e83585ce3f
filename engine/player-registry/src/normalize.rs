//! Name normalization
//!
//! Turns free-text person and team names into a comparison key. The function
//! is total and idempotent: `normalize(normalize(x)) == normalize(x)`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const GENERATIONAL_SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];

/// Normalize a person or team name into its comparison key
///
/// ```
/// use player_registry::normalize;
/// assert_eq!(normalize("Acuña Jr., Ronald"), "ronald acuna");
/// assert_eq!(normalize("Smith, John"), normalize("john   smith"));
/// ```
pub fn normalize(raw: &str) -> String {
    let cleaned = drop_annotations(raw);
    let folded = fold_to_latin(&cleaned);
    let ordered = reorder_last_first(&folded);
    let mut tokens: Vec<String> = ordered
        .split_whitespace()
        .map(strip_punctuation)
        .flat_map(|token| token.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|token| !token.is_empty())
        .collect();

    while tokens.len() > 1
        && tokens.last().is_some_and(|t| GENERATIONAL_SUFFIXES.contains(&t.as_str()))
    {
        tokens.pop();
    }

    tokens.join(" ")
}

/// Drop "(Minors)" style annotations and trailing " - note" suffixes
fn drop_annotations(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    match out.find(" - ") {
        Some(idx) => out[..idx].to_string(),
        None => out,
    }
}

/// Decompose, drop combining marks, lower-case, and map the few Latin letters
/// that have no decomposition
fn fold_to_latin(raw: &str) -> String {
    let stripped: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = stripped.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.nfkd().filter(|c| !is_combining_mark(*c)) {
        match ch {
            'ø' => out.push('o'),
            'ł' => out.push('l'),
            'đ' | 'ð' => out.push('d'),
            'ı' => out.push('i'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'þ' => out.push_str("th"),
            c if c.is_whitespace() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// "last, first" -> "first last"; only the first comma splits
fn reorder_last_first(name: &str) -> String {
    match name.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        Some((last, _)) => last.trim().to_string(),
        None => name.to_string(),
    }
}

/// Hyphens and underscores separate words; every other non-alphanumeric goes
fn strip_punctuation(token: &str) -> String {
    token
        .chars()
        .filter_map(|c| match c {
            '-' | '_' | '/' => Some(' '),
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}
