//! Run-scoped rule collection: global dedup and category grouping.

use ipnet::IpNet;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::info;

use crate::aggregator::{aggregate, count_ips, parse_cidr_entries};
use crate::config::{NetworkClass, RuleKind};
use crate::formatter::{directive_line, render_lines, render_plain, RenderOptions};

/// Identity of an output category: one plain file per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey {
    pub class: NetworkClass,
    pub kind: RuleKind,
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.class, self.kind)
    }
}

/// All rules collected during one update run.
///
/// The seen-set spans the whole run, not one category: an entry accepted
/// into any category blocks the same text everywhere else, so the first
/// source to publish an entry decides its routing class. Both maps live
/// only for the run and are mutated only through [`Ruleset::add`].
#[derive(Debug, Default)]
pub struct Ruleset {
    seen: HashSet<String>,
    categories: BTreeMap<CategoryKey, Vec<String>>,
}

/// Finalized output documents, keyed by file stem.
#[derive(Debug)]
pub struct RulesetOutput {
    /// Plain per-category lists, keyed by `<class>_<kind>`.
    pub plain: BTreeMap<String, String>,
    /// Clash directive documents, merged per routing class.
    pub directives: BTreeMap<NetworkClass, String>,
    /// IPv4 addresses covered by the aggregated CIDR categories.
    pub covered_v4: u64,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw entry. Returns false when the entry was already seen
    /// this run. Empty strings are accepted here and dropped at
    /// finalization, so provider payloads carrying blanks count as seen.
    pub fn add(&mut self, entry: &str, kind: &RuleKind, class: NetworkClass) -> bool {
        if self.seen.contains(entry) {
            return false;
        }
        self.seen.insert(entry.to_string());
        self.categories
            .entry(CategoryKey {
                class,
                kind: kind.clone(),
            })
            .or_default()
            .push(entry.to_string());
        true
    }

    /// Number of distinct entries accepted so far.
    pub fn unique_len(&self) -> usize {
        self.seen.len()
    }

    /// Per-category entry counts, in key order.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.categories
            .iter()
            .map(|(key, entries)| (key.to_string(), entries.len()))
            .collect()
    }

    /// Finalize the run: drop empty entries, compress CIDR categories to
    /// their minimal covering blocks, and render every output document.
    pub fn finalize(self, options: &RenderOptions) -> RulesetOutput {
        let mut plain = BTreeMap::new();
        let mut class_lines: BTreeMap<NetworkClass, Vec<String>> = BTreeMap::new();
        let mut covered_v4: u64 = 0;

        for (key, mut entries) in self.categories {
            entries.retain(|entry| !entry.is_empty());

            if key.kind == RuleKind::Cidr {
                let parsed = parse_cidr_entries(&entries);
                let aggregated = aggregate(&parsed);
                let v4: Vec<IpNet> = aggregated
                    .iter()
                    .filter(|net| matches!(net, IpNet::V4(_)))
                    .copied()
                    .collect();
                covered_v4 = covered_v4.saturating_add(count_ips(&v4) as u64);
                info!(
                    "{}: {} blocks aggregated to {}",
                    key,
                    parsed.len(),
                    aggregated.len()
                );
                entries = aggregated.iter().map(|net| net.to_string()).collect();
            }

            let lines = class_lines.entry(key.class).or_default();
            for entry in &entries {
                if let Some(line) = directive_line(&key.kind, entry, options) {
                    lines.push(line);
                }
            }

            plain.insert(key.to_string(), render_plain(&entries));
        }

        let directives = class_lines
            .into_iter()
            .map(|(class, lines)| (class, render_lines(lines)))
            .collect();

        RulesetOutput {
            plain,
            directives,
            covered_v4,
        }
    }
}
