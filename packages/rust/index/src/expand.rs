//! Query term expansion: exact, prefix and fuzzy matches against the term dictionary.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::LazyLock;

use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder};

use crate::index::Posting;

/// Upper bound on fuzzy edit distance regardless of term length.
pub const MAX_FUZZY_DISTANCE: u8 = 6;

/// Largest distance served by a precomputed automaton; wider searches fall
/// back to a bounded dynamic-programming distance.
const MAX_AUTOMATON_DISTANCE: u8 = 2;

const PREFIX_WEIGHT: f64 = 0.375;
const FUZZY_WEIGHT: f64 = 0.45;

/// Automaton builders for distances 1 and 2, without transpositions.
static LEV_BUILDERS: LazyLock<[LevenshteinAutomatonBuilder; 2]> = LazyLock::new(|| {
    [
        LevenshteinAutomatonBuilder::new(1, false),
        LevenshteinAutomatonBuilder::new(2, false),
    ]
});

/// Edit distance allowed for a term of `len` characters.
///
/// `fuzzy` below 1 is a fraction of the term length; 1 or above is an
/// absolute distance. Either way the result is capped at [`MAX_FUZZY_DISTANCE`].
pub fn fuzzy_distance(len: usize, fuzzy: f64) -> u8 {
    if fuzzy <= 0.0 {
        return 0;
    }
    let raw = if fuzzy < 1.0 {
        (len as f64 * fuzzy).round()
    } else {
        fuzzy.floor()
    };
    (raw as u8).min(MAX_FUZZY_DISTANCE)
}

/// Index terms matching `query_term`, each with its weight.
///
/// Exact matches weigh 1. Prefix completions and fuzzy neighbours are
/// discounted by how much longer, or how many edits away, they are. When a
/// term qualifies several ways the highest weight wins.
pub(crate) fn expand<'a>(
    terms: &'a BTreeMap<String, Vec<Posting>>,
    query_term: &str,
    fuzzy: f64,
    prefix: bool,
) -> Vec<(&'a str, f64)> {
    let mut matches: HashMap<&'a str, f64> = HashMap::new();
    let qlen = query_term.chars().count() as f64;

    if let Some((term, _)) = terms.get_key_value(query_term) {
        matches.insert(term.as_str(), 1.0);
    }

    if prefix {
        for (term, _) in terms
            .range::<str, _>((Bound::Included(query_term), Bound::Unbounded))
            .take_while(|(t, _)| t.starts_with(query_term))
        {
            let extra = term.chars().count() as f64 - qlen;
            if extra <= 0.0 {
                continue;
            }
            let weight = PREFIX_WEIGHT * qlen / (qlen + 0.3 * extra);
            keep_max(&mut matches, term, weight);
        }
    }

    let max_distance = fuzzy_distance(query_term.chars().count(), fuzzy);
    if max_distance > 0 && max_distance <= MAX_AUTOMATON_DISTANCE {
        let dfa = LEV_BUILDERS[usize::from(max_distance) - 1].build_dfa(query_term);
        for term in terms.keys() {
            if let Distance::Exact(d) = dfa.eval(term) {
                add_fuzzy(&mut matches, term, d, qlen);
            }
        }
    } else if max_distance > MAX_AUTOMATON_DISTANCE {
        let query: Vec<char> = query_term.chars().collect();
        for term in terms.keys() {
            if let Some(d) = bounded_distance(&query, term, max_distance) {
                add_fuzzy(&mut matches, term, d, qlen);
            }
        }
    }

    let mut expanded: Vec<(&'a str, f64)> = matches.into_iter().collect();
    expanded.sort_by(|a, b| a.0.cmp(b.0));
    expanded
}

fn add_fuzzy<'a>(matches: &mut HashMap<&'a str, f64>, term: &'a str, distance: u8, qlen: f64) {
    if distance == 0 {
        return;
    }
    let weight = FUZZY_WEIGHT * qlen / (qlen + f64::from(distance));
    keep_max(matches, term, weight);
}

/// Levenshtein distance between `query` and `term` if it is at most `max`.
///
/// Single-row dynamic programming that gives up as soon as every cell of a
/// row exceeds `max`.
fn bounded_distance(query: &[char], term: &str, max: u8) -> Option<u8> {
    let max = usize::from(max);
    let term: Vec<char> = term.chars().collect();
    if query.len().abs_diff(term.len()) > max {
        return None;
    }

    let mut row: Vec<usize> = (0..=query.len()).collect();
    for (i, tc) in term.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        let mut row_min = row[0];
        for (j, qc) in query.iter().enumerate() {
            let substitute = diagonal + usize::from(qc != tc);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
            row_min = row_min.min(row[j + 1]);
        }
        if row_min > max {
            return None;
        }
    }

    let distance = row[query.len()];
    (distance <= max).then(|| distance as u8)
}

fn keep_max<'a>(matches: &mut HashMap<&'a str, f64>, term: &'a str, weight: f64) {
    let entry = matches.entry(term).or_insert(weight);
    if weight > *entry {
        *entry = weight;
    }
}
