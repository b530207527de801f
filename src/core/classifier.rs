use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use super::model::{DomainGroup, Layer, LAYER_PRIORITY};

/// Top-level wrapper directories that carry no feature identity
const SCAFFOLDING_SEGMENTS: [&str; 9] = [
    "src", "lib", "libs", "app", "apps", "source", "sources", "packages", "pkg",
];

/// Heuristic path-based classifier: architectural layer per file and
/// feature domain per file.
///
/// Layer rules form an ordered table evaluated first-match-wins, so a path
/// containing both `api` and `util` segments classifies deterministically.
pub struct Classifier {
    layer_rules: Vec<(Regex, Layer)>,
}

impl Classifier {
    pub fn new() -> Self {
        // Fixed evaluation order: api, service, model, util, ui,
        // config, test.
        let table: [(&str, Layer); 7] = [
            (r"(^|/)(api|routes?|controllers?|handlers?|endpoints?)(/|\.|$)", Layer::Api),
            (r"(^|/)(services?|usecases?|use_cases?|application|domain)(/|\.|$)", Layer::Service),
            (r"(^|/)(models?|entities|entity|schemas?|types|dto)(/|\.|$)", Layer::Model),
            (r"(^|/)(utils?|helpers?|lib|libs|common|shared)(/|\.|$)", Layer::Util),
            (r"(^|/)(components?|views?|pages?|ui|screens?|widgets?|layouts?)(/|\.|$)", Layer::Ui),
            (r"(^|/)(config|configs|settings|conf)(/|\.|$)", Layer::Config),
            (r"(^|/)(tests?|__tests__|specs?|e2e)(/|\.|$)", Layer::Test),
        ];

        let layer_rules = table
            .iter()
            .map(|(pattern, layer)| {
                (
                    Regex::new(pattern).expect("Invalid layer rule pattern"),
                    *layer,
                )
            })
            .collect();

        Self { layer_rules }
    }

    /// Layer of a file, from its repo-relative path. First matching rule
    /// wins; unmatched paths are `other`.
    pub fn layer_of(&self, path: &Path) -> Layer {
        let normalized = path.to_string_lossy().replace('\\', "/").to_lowercase();

        for (rule, layer) in &self.layer_rules {
            if rule.is_match(&normalized) {
                return *layer;
            }
        }

        Layer::Other
    }

    /// Domain of a file: the first directory segment that is neither
    /// scaffolding nor hidden/private. Files directly under scaffolding
    /// have no domain.
    pub fn domain_of(&self, path: &Path) -> Option<String> {
        let components: Vec<String> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        // The last component is the file name, never a domain
        for segment in components.iter().take(components.len().saturating_sub(1)) {
            if segment.starts_with('.') || segment.starts_with('_') {
                continue;
            }
            if SCAFFOLDING_SEGMENTS.contains(&segment.to_lowercase().as_str()) {
                continue;
            }
            return Some(segment.clone());
        }

        None
    }

    /// Group files into domains. Domains with fewer than two members are
    /// suppressed as noise. Output is ordered largest-first, name ascending
    /// on ties.
    pub fn group_domains(&self, layers: &BTreeMap<std::path::PathBuf, Layer>) -> Vec<DomainGroup> {
        let mut members: BTreeMap<String, Vec<Layer>> = BTreeMap::new();

        for (path, layer) in layers {
            if let Some(domain) = self.domain_of(path) {
                members.entry(domain).or_default().push(*layer);
            }
        }

        let mut groups: Vec<DomainGroup> = members
            .into_iter()
            .filter(|(_, layers)| layers.len() >= 2)
            .map(|(name, layers)| DomainGroup {
                name,
                file_count: layers.len(),
                dominant_layer: dominant_layer(&layers),
            })
            .collect();

        groups.sort_by(|a, b| {
            b.file_count
                .cmp(&a.file_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        groups
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Majority vote over member layers, ties broken by the fixed layer
/// priority order.
pub fn dominant_layer(layers: &[Layer]) -> Layer {
    let mut counts: BTreeMap<Layer, usize> = BTreeMap::new();
    for layer in layers {
        *counts.entry(*layer).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .min_by_key(|(layer, count)| (std::cmp::Reverse(*count), layer.priority_index()))
        .map(|(layer, _)| layer)
        .unwrap_or(Layer::Other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn classifier() -> Classifier {
        Classifier::new()
    }

    #[test]
    fn test_layering_scenario() {
        let c = classifier();
        assert_eq!(c.layer_of(Path::new("src/api/routes.ts")), Layer::Api);
        assert_eq!(c.layer_of(Path::new("src/services/user.ts")), Layer::Service);
        assert_eq!(c.layer_of(Path::new("src/models/user.ts")), Layer::Model);
        assert_eq!(c.layer_of(Path::new("src/misc/thing.ts")), Layer::Other);
    }

    #[test]
    fn test_first_match_wins_deterministically() {
        let c = classifier();
        // Both api and util segments present: api rule is evaluated first.
        assert_eq!(c.layer_of(Path::new("src/api/util/format.ts")), Layer::Api);
        assert_eq!(c.layer_of(Path::new("src/utils/api_client.ts")), Layer::Util);
    }

    #[test]
    fn test_filename_segments_classify_too() {
        let c = classifier();
        assert_eq!(c.layer_of(Path::new("src/routes.ts")), Layer::Api);
        assert_eq!(c.layer_of(Path::new("src/settings.py")), Layer::Config);
        assert_eq!(c.layer_of(Path::new("pkg/server_test.go")), Layer::Other);
    }

    #[test]
    fn test_domain_strips_scaffolding() {
        let c = classifier();
        assert_eq!(c.domain_of(Path::new("src/auth/login.ts")), Some("auth".to_string()));
        assert_eq!(c.domain_of(Path::new("packages/app/users/list.ts")), Some("users".to_string()));
        assert_eq!(c.domain_of(Path::new("src/index.ts")), None);
        assert_eq!(c.domain_of(Path::new("src/__private/x.ts")), None);
    }

    #[test]
    fn test_domain_grouping_scenario() {
        let c = classifier();
        let mut layers = BTreeMap::new();
        for p in [
            "src/auth/login.ts",
            "src/auth/logout.ts",
            "src/users/create.ts",
            "src/users/list.ts",
            "src/lonely/one.ts",
        ] {
            layers.insert(PathBuf::from(p), c.layer_of(Path::new(p)));
        }

        let groups = c.group_domains(&layers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "auth");
        assert_eq!(groups[0].file_count, 2);
        assert_eq!(groups[1].name, "users");
        assert_eq!(groups[1].file_count, 2);

        // A third users file pushes its count to 3 and reorders the groups
        layers.insert(
            PathBuf::from("src/users/delete.ts"),
            c.layer_of(Path::new("src/users/delete.ts")),
        );
        let groups = c.group_domains(&layers);
        assert_eq!(groups[0].name, "users");
        assert_eq!(groups[0].file_count, 3);
    }

    #[test]
    fn test_dominant_layer_majority_and_tie_break() {
        assert_eq!(
            dominant_layer(&[Layer::Service, Layer::Service, Layer::Util]),
            Layer::Service
        );
        // Tie between model and api resolves to api (higher priority)
        assert_eq!(dominant_layer(&[Layer::Model, Layer::Api]), Layer::Api);
        assert_eq!(dominant_layer(&[]), Layer::Other);
    }
}
