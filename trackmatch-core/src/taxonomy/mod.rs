//! Genre taxonomy
//!
//! Maps noisy free-text genre tags onto a fixed tree of canonical genres.
//!
//! # Data
//! - **Tree**: nested YAML of genre → children. Flattened into a whitelist of
//!   every genre name and a list of root-to-leaf branches.
//! - **Aliases**: canonical genre → list of synonyms.
//!
//! Both are loaded once and never mutated afterwards, so a `GenreTaxonomy` can
//! be shared between threads (e.g. behind an `Arc`) without locking.
//!
//! # Resolution
//! Each tag is normalized (whitelist → alias → hyphen → "and" rewrite), then
//! expanded to its lineage, most specific genre first. Lineages contained in a
//! longer lineage are dropped, and each genre carries the summed score of the
//! tags that normalized to it.

pub mod tree;

use crate::error::TaxonomyError;
use crate::types::{CanonicalPath, GenreTag};
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, trace, warn};
use trackmatch_common::config::TaxonomyConfig;

use self::tree::{deduplicate, remove_subsets, title_case, tree_paths};

const BUNDLED_TREE: &str = include_str!("../../data/genres-tree.yaml");
const BUNDLED_ALIASES: &str = include_str!("../../data/genre-aliases.yaml");

/// Variants of "and" rewritten before the final whitelist check
const AND_VARIANTS: &[&str] = &["'n'", " n ", " & "];

/// Read-only genre taxonomy
#[derive(Debug, Clone)]
pub struct GenreTaxonomy {
    whitelist: HashSet<String>,
    /// Root-to-leaf paths, in file order
    branches: Vec<Vec<String>>,
    /// Canonical name → synonyms, in file order
    aliases: Vec<(String, Vec<String>)>,
    /// Synonym → canonical name (first listing wins)
    alias_lookup: HashMap<String, String>,
    /// Genre → (branch index, position) of its first occurrence
    positions: HashMap<String, (usize, usize)>,
}

impl GenreTaxonomy {
    /// Load the taxonomy described by `config`
    ///
    /// Paths that are not set fall back to the bundled data.
    pub fn load(config: &TaxonomyConfig) -> Result<Self, TaxonomyError> {
        let tree = match &config.tree_path {
            Some(path) => read_file(path)?,
            None => BUNDLED_TREE.to_string(),
        };
        let aliases = match &config.alias_path {
            Some(path) => read_file(path)?,
            None => BUNDLED_ALIASES.to_string(),
        };

        let tree_origin = origin(config.tree_path.as_deref(), "bundled genres-tree.yaml");
        let alias_origin = origin(config.alias_path.as_deref(), "bundled genre-aliases.yaml");
        let taxonomy = Self::parse(&tree, &tree_origin, &aliases, &alias_origin)?;

        info!(
            genres = taxonomy.whitelist.len(),
            branches = taxonomy.branches.len(),
            aliases = taxonomy.alias_lookup.len(),
            tree = %tree_origin,
            "Genre taxonomy loaded"
        );
        Ok(taxonomy)
    }

    /// Taxonomy built from the data shipped with this crate
    pub fn bundled() -> Result<Self, TaxonomyError> {
        Self::load(&TaxonomyConfig::default())
    }

    /// Build a taxonomy from YAML text
    pub fn from_yaml(tree: &str, aliases: &str) -> Result<Self, TaxonomyError> {
        Self::parse(tree, "tree text", aliases, "alias text")
    }

    fn parse(
        tree: &str,
        tree_origin: &str,
        aliases: &str,
        alias_origin: &str,
    ) -> Result<Self, TaxonomyError> {
        let tree: Value = serde_yaml::from_str(tree).map_err(|source| TaxonomyError::Parse {
            origin: tree_origin.to_string(),
            source,
        })?;
        let aliases: Value =
            serde_yaml::from_str(aliases).map_err(|source| TaxonomyError::Parse {
                origin: alias_origin.to_string(),
                source,
            })?;

        let branches = tree_paths(&tree)?;
        Ok(Self::from_parts(branches, parse_aliases(&aliases)?))
    }

    /// Build a taxonomy from root-to-leaf branches and an alias table
    pub fn from_parts(branches: Vec<Vec<String>>, aliases: Vec<(String, Vec<String>)>) -> Self {
        let mut whitelist = HashSet::new();
        let mut positions = HashMap::new();
        for (branch_idx, branch) in branches.iter().enumerate() {
            for (pos, name) in branch.iter().enumerate() {
                whitelist.insert(name.clone());
                positions.entry(name.clone()).or_insert((branch_idx, pos));
            }
        }

        let mut alias_lookup = HashMap::new();
        for (canonical, synonyms) in &aliases {
            if !whitelist.contains(canonical) {
                warn!(genre = %canonical, "Alias target is not in the genre tree");
            }
            for synonym in synonyms {
                alias_lookup
                    .entry(synonym.clone())
                    .or_insert_with(|| canonical.clone());
            }
        }

        Self {
            whitelist,
            branches,
            aliases,
            alias_lookup,
            positions,
        }
    }

    /// Every genre name in the tree
    pub fn whitelist(&self) -> &HashSet<String> {
        &self.whitelist
    }

    /// Root-to-leaf branches of the tree
    pub fn branches(&self) -> &[Vec<String>] {
        &self.branches
    }

    /// Canonical genre → synonyms
    pub fn aliases(&self) -> &[(String, Vec<String>)] {
        &self.aliases
    }

    /// Whether `genre` is a canonical genre name
    pub fn is_allowed(&self, genre: &str) -> bool {
        self.whitelist.contains(genre)
    }

    /// Canonical genre for a known synonym
    pub fn find_alias(&self, tag: &str) -> Option<&str> {
        self.alias_lookup.get(tag).map(String::as_str)
    }

    /// Find the canonical genre name for a free-text tag
    ///
    /// Tried in order: the lower-cased tag itself, alias lookup, hyphens as
    /// spaces, then "'n'", " n " and " & " as " and ". The hyphen rewrite
    /// carries into the "and" rewrite.
    pub fn normalize_tag(&self, tag: &str) -> Option<String> {
        let mut tag = tag.trim().to_lowercase();

        if self.is_allowed(&tag) {
            return Some(tag);
        }

        if let Some(alias) = self.find_alias(&tag) {
            return Some(alias.to_string());
        }

        if tag.contains('-') {
            tag = tag.replace('-', " ");
            if self.is_allowed(&tag) {
                return Some(tag);
            }
        }

        let mut rewritten = false;
        for &variant in AND_VARIANTS {
            if tag.contains(variant) {
                tag = tag.replace(variant, " and ");
                rewritten = true;
            }
        }
        if rewritten {
            tag = tag.split_whitespace().collect::<Vec<_>>().join(" ");
            if self.is_allowed(&tag) {
                return Some(tag);
            }
        }

        trace!(tag = %tag, "Genre tag not in taxonomy");
        None
    }

    /// Lineage of a canonical genre, most specific first
    ///
    /// Uses the first branch containing the genre. A genre found in no branch
    /// is its own lineage.
    pub fn find_parents(&self, genre: &str) -> Vec<String> {
        match self.positions.get(genre) {
            Some(&(branch_idx, pos)) => self.branches[branch_idx][..=pos]
                .iter()
                .rev()
                .cloned()
                .collect(),
            None => vec![genre.to_string()],
        }
    }

    /// Depth of a genre in its first branch (roots are 0)
    pub fn depth(&self, genre: &str) -> Option<usize> {
        self.positions.get(genre).map(|&(_, pos)| pos)
    }

    /// Sort genres deepest first, dropping names not in the tree
    pub fn sort_by_depth(&self, genres: &[String]) -> Vec<String> {
        let mut pairs: Vec<(usize, &String)> = genres
            .iter()
            .filter_map(|g| self.depth(g).map(|d| (d, g)))
            .collect();
        pairs.sort_by(|a, b| b.cmp(a));
        pairs.into_iter().map(|(_, g)| g.clone()).collect()
    }

    /// Resolve a single tag with score 1.0
    pub fn resolve_genre(&self, tag: &str) -> Vec<CanonicalPath> {
        self.resolve_genres(&[GenreTag::unweighted(tag)])
    }

    /// Resolve free-text tags to non-redundant canonical lineages
    ///
    /// Unresolvable tags are dropped. Genres are title-cased and carry the
    /// summed score of every input tag that normalized to them, or 1.0 when
    /// no tag named them directly.
    pub fn resolve_genres(&self, tags: &[GenreTag]) -> Vec<CanonicalPath> {
        if tags.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<String, f64> = HashMap::new();
        let mut names = Vec::new();
        for tag in tags {
            match self.normalize_tag(&tag.name) {
                Some(name) => {
                    *scores.entry(name.clone()).or_insert(0.0) += tag.score;
                    names.push(name);
                }
                None => debug!(tag = %tag.name, "Dropped unresolvable genre tag"),
            }
        }

        let lineages: Vec<Vec<String>> = deduplicate(names)
            .iter()
            .map(|name| self.find_parents(name))
            .collect();

        remove_subsets(lineages)
            .into_iter()
            .map(|lineage| {
                lineage
                    .iter()
                    .map(|name| GenreTag {
                        name: title_case(name),
                        score: scores.get(name).copied().unwrap_or(1.0),
                    })
                    .collect()
            })
            .collect()
    }
}

fn read_file(path: &Path) -> Result<String, TaxonomyError> {
    std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn origin(path: Option<&Path>, bundled: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| bundled.to_string())
}

fn parse_aliases(value: &Value) -> Result<Vec<(String, Vec<String>)>, TaxonomyError> {
    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(TaxonomyError::InvalidAliases(format!(
                "expected a mapping, found {:?}",
                other
            )))
        }
    };

    let mut aliases = Vec::with_capacity(map.len());
    for (key, synonyms) in map {
        let canonical = key
            .as_str()
            .ok_or_else(|| TaxonomyError::InvalidAliases(format!("non-string key {:?}", key)))?
            .trim()
            .to_lowercase();

        let synonyms = match synonyms {
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|s| s.trim().to_lowercase())
                        .ok_or_else(|| {
                            TaxonomyError::InvalidAliases(format!(
                                "non-string alias {:?} for {}",
                                item, canonical
                            ))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Null => Vec::new(),
            other => {
                return Err(TaxonomyError::InvalidAliases(format!(
                    "expected a list of aliases for {}, found {:?}",
                    canonical, other
                )))
            }
        };
        aliases.push((canonical, synonyms));
    }
    Ok(aliases)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"
- electronic:
    - trance:
        - goa trance:
            - psytrance
        - uplifting trance
    - drum and bass:
        - jungle
    - dubstep
- pop:
    - c-pop
    - k-pop
- hip hop
"#;

    const ALIASES: &str = r#"
drum and bass:
  - dnb
hip hop:
  - rap
"#;

    fn taxonomy() -> GenreTaxonomy {
        GenreTaxonomy::from_yaml(TREE, ALIASES).unwrap()
    }

    fn names(path: &CanonicalPath) -> Vec<&str> {
        path.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_whitelisted() {
        assert_eq!(taxonomy().normalize_tag("Dubstep").as_deref(), Some("dubstep"));
    }

    #[test]
    fn test_normalize_alias() {
        assert_eq!(taxonomy().normalize_tag("DnB").as_deref(), Some("drum and bass"));
        assert_eq!(taxonomy().normalize_tag("rap").as_deref(), Some("hip hop"));
    }

    #[test]
    fn test_normalize_hyphen() {
        assert_eq!(taxonomy().normalize_tag("hip-hop").as_deref(), Some("hip hop"));
        // hyphenated names in the tree are accepted before any rewrite
        assert_eq!(taxonomy().normalize_tag("c-pop").as_deref(), Some("c-pop"));
    }

    #[test]
    fn test_normalize_and_variants() {
        let taxonomy = taxonomy();
        assert_eq!(taxonomy.normalize_tag("drum 'n' bass").as_deref(), Some("drum and bass"));
        assert_eq!(taxonomy.normalize_tag("drum n bass").as_deref(), Some("drum and bass"));
        assert_eq!(taxonomy.normalize_tag("drum & bass").as_deref(), Some("drum and bass"));
        assert_eq!(taxonomy.normalize_tag("drum-n-bass").as_deref(), Some("drum and bass"));
    }

    #[test]
    fn test_normalize_unknown() {
        assert_eq!(taxonomy().normalize_tag("seen live"), None);
    }

    #[test]
    fn test_find_parents() {
        assert_eq!(
            taxonomy().find_parents("psytrance"),
            vec!["psytrance", "goa trance", "trance", "electronic"]
        );
        assert_eq!(taxonomy().find_parents("unlisted"), vec!["unlisted"]);
    }

    #[test]
    fn test_resolve_single_genre() {
        let paths = taxonomy().resolve_genre("dubstep");
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&paths[0]), vec!["Dubstep", "Electronic"]);
    }

    #[test]
    fn test_resolve_removes_subset_paths() {
        let tags = vec![GenreTag::unweighted("Trance"), GenreTag::unweighted("Goa Trance")];
        let paths = taxonomy().resolve_genres(&tags);
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&paths[0]), vec!["Goa Trance", "Trance", "Electronic"]);
    }

    #[test]
    fn test_resolve_sums_scores() {
        let tags = vec![
            GenreTag::new("dnb", 2.0),
            GenreTag::new("Drum and Bass", 3.0),
            GenreTag::new("jungle", 0.5),
        ];
        let paths = taxonomy().resolve_genres(&tags);
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert_eq!(names(path), vec!["Jungle", "Drum And Bass", "Electronic"]);
        assert_eq!(path[0].score, 0.5);
        assert_eq!(path[1].score, 5.0);
        // ancestor never named directly
        assert_eq!(path[2].score, 1.0);
    }

    #[test]
    fn test_resolve_keeps_separate_lineages_in_order() {
        let tags = vec![
            GenreTag::unweighted("k-pop"),
            GenreTag::unweighted("not a genre"),
            GenreTag::unweighted("psytrance"),
        ];
        let paths = taxonomy().resolve_genres(&tags);
        assert_eq!(paths.len(), 2);
        assert_eq!(names(&paths[0]), vec!["K-Pop", "Pop"]);
        assert_eq!(names(&paths[1]), vec!["Psytrance", "Goa Trance", "Trance", "Electronic"]);
    }

    #[test]
    fn test_resolve_empty() {
        assert!(taxonomy().resolve_genres(&[]).is_empty());
        assert!(taxonomy().resolve_genre("seen live").is_empty());
    }

    #[test]
    fn test_resolve_is_stable() {
        let taxonomy = taxonomy();
        let first = taxonomy.resolve_genres(&[
            GenreTag::unweighted("jungle"),
            GenreTag::unweighted("rap"),
            GenreTag::unweighted("trance"),
        ]);
        let flattened: Vec<GenreTag> = first.iter().flatten().cloned().collect();
        let second = taxonomy.resolve_genres(&flattened);

        let roots = |paths: &[CanonicalPath]| -> Vec<String> {
            paths.iter().filter_map(|p| p.last()).map(|t| t.name.clone()).collect()
        };
        assert_eq!(roots(&first), roots(&second));
        assert_eq!(second.len(), first.len());
    }

    #[test]
    fn test_depth_and_sort() {
        let taxonomy = taxonomy();
        assert_eq!(taxonomy.depth("electronic"), Some(0));
        assert_eq!(taxonomy.depth("psytrance"), Some(3));
        assert_eq!(taxonomy.depth("unknown"), None);

        let sorted = taxonomy.sort_by_depth(&[
            "trance".to_string(),
            "unknown".to_string(),
            "psytrance".to_string(),
            "electronic".to_string(),
        ]);
        assert_eq!(sorted, vec!["psytrance", "trance", "electronic"]);
    }

    #[test]
    fn test_malformed_tree_rejected() {
        let result = GenreTaxonomy::from_yaml("- electronic: [unclosed", ALIASES);
        assert!(matches!(result, Err(TaxonomyError::Parse { .. })));
    }

    #[test]
    fn test_malformed_aliases_rejected() {
        let result = GenreTaxonomy::from_yaml(TREE, "- just\n- a list\n");
        assert!(matches!(result, Err(TaxonomyError::InvalidAliases(_))));
    }
}
