//! Genre tree walking and path helpers

use crate::error::TaxonomyError;
use serde_yaml::Value;
use std::collections::HashSet;

/// Collect every root-to-leaf path in a nested tree
///
/// Mapping keys are inner genres, strings (and numbers) are leaves. A key
/// with no children ends a branch on its own.
pub fn tree_paths(tree: &Value) -> Result<Vec<Vec<String>>, TaxonomyError> {
    let mut branches = Vec::new();
    walk(tree, &mut Vec::new(), &mut branches)?;
    Ok(branches)
}

fn walk(
    node: &Value,
    path: &mut Vec<String>,
    branches: &mut Vec<Vec<String>>,
) -> Result<(), TaxonomyError> {
    match node {
        Value::Mapping(map) => {
            for (key, children) in map {
                path.push(genre_name(key)?);
                if children.is_null() {
                    branches.push(path.clone());
                } else {
                    walk(children, path, branches)?;
                }
                path.pop();
            }
        }
        Value::Sequence(items) => {
            for item in items {
                walk(item, path, branches)?;
            }
        }
        Value::Null => {}
        leaf => {
            let mut branch = path.clone();
            branch.push(genre_name(leaf)?);
            branches.push(branch);
        }
    }
    Ok(())
}

fn genre_name(value: &Value) -> Result<String, TaxonomyError> {
    match value {
        Value::String(s) => Ok(s.trim().to_lowercase()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(TaxonomyError::InvalidTree(format!(
            "expected a genre name, found {:?}",
            other
        ))),
    }
}

/// Remove duplicates while preserving first-seen order
pub fn deduplicate(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Keep only paths that are not contained in another path
///
/// A path is dropped when its name set is a strict subset of another path's.
/// Of two paths with identical name sets only the first is kept.
pub fn remove_subsets(paths: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let sets: Vec<HashSet<&str>> = paths
        .iter()
        .map(|p| p.iter().map(String::as_str).collect())
        .collect();

    let keep: Vec<bool> = sets
        .iter()
        .enumerate()
        .map(|(i, set)| {
            !sets.iter().enumerate().any(|(j, other)| {
                i != j
                    && set.is_subset(other)
                    && (set.len() < other.len() || j < i)
            })
        })
        .collect();

    paths
        .into_iter()
        .zip(keep)
        .filter_map(|(path, keep)| keep.then_some(path))
        .collect()
}

/// Capitalise the first letter of every word, lower-casing the rest
///
/// A word starts after any non-letter, so "c-pop" becomes "C-Pop" and "r&b"
/// becomes "R&B".
pub fn title_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }
    result
}
