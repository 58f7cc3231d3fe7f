//! Heuristiques sur les corps de fonction : prose (corps non compilable,
//! ignoré) et expression unique (`DEFX`).

use crate::scan;

/// Mots typiques d'une description en langue naturelle.
const PROSE_WORDS: [&str; 16] = [
    "the", "of", "using", "that", "this", "which", "output", "formatted", "simple", "value", "computes", "returns",
    "calculates", "function", "a", "an",
];

/// Longueur maximale d'un corps à une expression.
pub const ONELINER_MAX: usize = 120;

/// Le corps ressemble-t-il à une phrase plutôt qu'à du code ?
///
/// Une ligne d'au moins trois mots, deux mots de prose en tout, aucune
/// ponctuation de code (`( { = ; "`) et aucun opérateur isolé : `a + a` ou
/// une suite de lignes `a` rendues par le décompilateur ne sont jamais de la
/// prose.
pub fn is_prose(body: &str) -> bool {
    if body.contains(['(', '{', '=', ';', '"']) {
        return false;
    }
    let words: Vec<String> = body
        .split_whitespace()
        .map(|w| w.trim_matches(|c| ".,;:".contains(c)).to_lowercase())
        .collect();
    if words.iter().any(|w| !w.is_empty() && !w.chars().any(char::is_alphanumeric)) {
        return false;
    }
    if body.lines().any(|l| is_statement(l.trim())) {
        return false;
    }
    body.lines().any(|l| l.split_whitespace().count() >= 3)
        && words.iter().filter(|w| PROSE_WORDS.contains(&w.as_str())).count() >= 2
}

/// Le corps est-il une expression unique ?
pub fn is_oneliner(body: &str) -> bool {
    let b = body.trim();
    if b.is_empty() || b.len() >= ONELINER_MAX {
        return false;
    }
    let code = scan::blank_strings(b);
    if code.contains(['{', '\n', ';']) || ["for", "while", "if"].iter().any(|kw| scan::has_keyword(&code, kw)) {
        return false;
    }
    !is_statement(b)
}

fn is_statement(s: &str) -> bool {
    ["return", "break", "continue"].iter().any(|kw| scan::after_keyword(s, kw).is_some())
        || scan::find_top(s, ":=").is_some()
        || scan::find_compound(s).is_some_and(|(at, _)| scan::is_identifier(s[..at].trim()))
        || scan::find_assign(s).is_some_and(|at| scan::is_identifier(s[..at].trim()))
}
