use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::constants::CITATION_COLUMN;
use crate::table::Table;

/// Outcome of a table-level disambiguation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disambiguation {
    Applied { renamed: usize },
    /// The citation column was absent; nothing was changed
    Skipped,
}

/// Letter suffix for the n-th repeat of a citation: 1 -> `b`, 25 -> `z`, 26 -> `ba`.
///
/// This is `n` written in base 26 with digits `a..z`, so suffixes grow with `n`.
pub fn suffix_for(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    letters.iter().rev().collect()
}

/// Make repeated citation labels unique.
///
/// The first occurrence keeps its label; later ones get `-b`, `-c`, ... in row order.
/// A candidate that collides with a label already in the input is skipped.
pub fn disambiguate(citations: &[String]) -> Vec<String> {
    let existing: HashSet<&str> = citations.iter().map(String::as_str).collect();
    let mut emitted: HashSet<String> = HashSet::with_capacity(citations.len());
    let mut next_suffix: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::with_capacity(citations.len());

    for citation in citations {
        let label = match next_suffix.get_mut(citation.as_str()) {
            None => {
                next_suffix.insert(citation.as_str(), 1);
                citation.clone()
            }
            Some(next) => loop {
                let candidate = format!("{}-{}", citation, suffix_for(*next));
                *next += 1;
                if !existing.contains(candidate.as_str()) && !emitted.contains(&candidate) {
                    debug!("Citation '{}' repeated, relabelled '{}'", citation, candidate);
                    break candidate;
                }
            },
        };
        emitted.insert(label.clone());
        out.push(label);
    }
    out
}

/// Disambiguate the citation column in place.
pub fn disambiguate_table(table: &mut Table) -> Disambiguation {
    let Some(col) = table.resolve_column(CITATION_COLUMN, &[]) else {
        warn!("Column '{}' not found; skipping citation disambiguation", CITATION_COLUMN);
        return Disambiguation::Skipped;
    };

    // Null citations are left alone; only labelled rows take part
    let labelled: Vec<(usize, String)> = table
        .column_values(col)
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v.to_string())))
        .collect();
    let originals: Vec<String> = labelled.iter().map(|(_, v)| v.clone()).collect();
    let relabelled = disambiguate(&originals);

    let mut renamed = 0;
    for ((row, original), label) in labelled.into_iter().zip(relabelled) {
        if label != original {
            table.set(row, col, Some(label));
            renamed += 1;
        }
    }

    if renamed > 0 {
        info!("Disambiguated {} repeated citations", renamed);
    }
    Disambiguation::Applied { renamed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_suffix_for() {
        assert_eq!(suffix_for(1), "b");
        assert_eq!(suffix_for(2), "c");
        assert_eq!(suffix_for(25), "z");
        assert_eq!(suffix_for(26), "ba");
        assert_eq!(suffix_for(27), "bb");
    }

    #[test]
    fn test_repeats_get_increasing_suffixes() {
        let out = disambiguate(&labels(&["Smith2020", "Doe2021", "Smith2020", "Smith2020"]));
        assert_eq!(out, labels(&["Smith2020", "Doe2021", "Smith2020-b", "Smith2020-c"]));
    }

    #[test]
    fn test_generated_label_never_shadows_existing_one() {
        let out = disambiguate(&labels(&["Smith2020", "Smith2020", "Smith2020-b"]));
        assert_eq!(out, labels(&["Smith2020", "Smith2020-c", "Smith2020-b"]));

        let unique: HashSet<&String> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
    }

    #[test]
    fn test_many_repeats_stay_distinct() {
        let input = vec!["Lee2019".to_string(); 60];
        let out = disambiguate(&input);
        let unique: HashSet<&String> = out.iter().collect();
        assert_eq!(unique.len(), 60);
        assert_eq!(out[0], "Lee2019");
        assert_eq!(out[26], "Lee2019-ba");
    }

    #[test]
    fn test_table_without_citation_is_skipped() {
        let mut table = Table::from_rows(["title"], vec![vec!["A"]]);
        assert_eq!(disambiguate_table(&mut table), Disambiguation::Skipped);
    }

    #[test]
    fn test_table_relabels_in_row_order() {
        let mut table = Table::from_rows(
            ["title", "citation"],
            vec![vec!["A", "Smith2020"], vec!["B", "Smith2020"], vec!["C", ""]],
        );
        assert_eq!(disambiguate_table(&mut table), Disambiguation::Applied { renamed: 1 });
        assert_eq!(table.get(0, 1), Some("Smith2020"));
        assert_eq!(table.get(1, 1), Some("Smith2020-b"));
        assert_eq!(table.get(2, 1), None);
    }
}
