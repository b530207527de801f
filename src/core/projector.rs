use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use regex::Regex;

use super::classifier::dominant_layer;
use super::diagrams::{DiagramRecord, AUTO_LABEL};
use super::model::{CodebaseModel, Layer, LAYER_PRIORITY};
use crate::config::DiagramConfig;

/// Projects the current model into Mermaid diagram records.
///
/// All output here carries the `auto` label and is regenerated wholesale on
/// every analysis pass; externally merged diagrams are never touched.
pub struct DiagramProjector {
    max_graph_nodes: usize,
    max_domains: usize,
    flow_fanout: usize,
    max_flows: usize,
    verb_re: Regex,
}

impl DiagramProjector {
    pub fn new(config: &DiagramConfig) -> Self {
        Self {
            max_graph_nodes: config.max_graph_nodes,
            max_domains: config.max_domains,
            flow_fanout: config.flow_fanout,
            max_flows: config.max_flows,
            verb_re: Regex::new(r"(?i)^(get|post|put|patch|delete|head|options|handle)")
                .expect("Invalid entry point verb regex"),
        }
    }

    /// Regenerate every model-derived diagram
    pub fn project(&self, model: &CodebaseModel) -> Vec<DiagramRecord> {
        if model.files.is_empty() {
            return Vec::new();
        }

        let mut records = Vec::new();

        records.push(self.layer_overview(model));

        if let Some(domains) = self.domain_map(model) {
            records.push(domains);
        }
        if let Some(deps) = self.layer_dependencies(model) {
            records.push(deps);
        }

        records.push(self.component_graph(model));
        records.extend(self.flows(model));

        records
    }

    /// One-line human summary of the projected model
    pub fn summary(&self, model: &CodebaseModel) -> String {
        format!(
            "{} files, {} domains, {} dependency edges across {} layers",
            model.files.len(),
            model.domains.len(),
            model.edges.len(),
            model.layer_counts().len()
        )
    }

    /// One node per non-empty layer in fixed priority order; edges only
    /// between adjacent non-empty layers, expressing typical layering.
    fn layer_overview(&self, model: &CodebaseModel) -> DiagramRecord {
        let counts = model.layer_counts();
        let present: Vec<Layer> = LAYER_PRIORITY
            .iter()
            .copied()
            .filter(|l| counts.contains_key(l))
            .collect();

        let mut markup = String::from("flowchart TD\n");
        for layer in &present {
            markup.push_str(&format!(
                "    {}[\"{} ({})\"]\n",
                layer.name(),
                layer.name(),
                file_count_label(counts[layer])
            ));
        }
        for pair in present.windows(2) {
            markup.push_str(&format!("    {} --> {}\n", pair[0].name(), pair[1].name()));
        }

        auto_record(
            "layers",
            "architecture",
            "Layer Overview",
            "Architectural layers by file count",
            markup,
            90,
        )
    }

    /// Top-N domains by file count; dashed edges between size-adjacent
    /// domains whose dominant layers differ, signaling cross-cutting
    /// concerns.
    fn domain_map(&self, model: &CodebaseModel) -> Option<DiagramRecord> {
        if model.domains.is_empty() {
            return None;
        }

        let shown = &model.domains[..model.domains.len().min(self.max_domains)];

        let mut markup = String::from("flowchart LR\n");
        for domain in shown {
            markup.push_str(&format!(
                "    {}[\"{} ({}, {})\"]\n",
                node_id(&domain.name),
                escape(&domain.name),
                file_count_label(domain.file_count),
                domain.dominant_layer.name()
            ));
        }
        for pair in shown.windows(2) {
            if pair[0].dominant_layer != pair[1].dominant_layer {
                markup.push_str(&format!(
                    "    {} -.-> {}\n",
                    node_id(&pair[0].name),
                    node_id(&pair[1].name)
                ));
            }
        }

        Some(auto_record(
            "domains",
            "architecture",
            "Domain Map",
            "Feature domains by size and dominant layer",
            markup,
            80,
        ))
    }

    /// Distinct directed layer-to-layer relations observed in the
    /// dependency edges.
    fn layer_dependencies(&self, model: &CodebaseModel) -> Option<DiagramRecord> {
        let mut relations: BTreeSet<(Layer, Layer)> = BTreeSet::new();

        for edge in &model.edges {
            let source = model.layer_of(&edge.source);
            let target = model.layer_of(&edge.target);
            if source != target {
                relations.insert((source, target));
            }
        }

        if relations.is_empty() {
            return None;
        }

        let mut participants: BTreeSet<Layer> = BTreeSet::new();
        for (source, target) in &relations {
            participants.insert(*source);
            participants.insert(*target);
        }

        let mut ordered: Vec<Layer> = participants.into_iter().collect();
        ordered.sort_by_key(|l| l.priority_index());

        let mut sorted_relations: Vec<(Layer, Layer)> = relations.into_iter().collect();
        sorted_relations
            .sort_by_key(|(s, t)| (s.priority_index(), t.priority_index()));

        let mut markup = String::from("flowchart LR\n");
        for layer in &ordered {
            markup.push_str(&format!("    {}[\"{}\"]\n", layer.name(), layer.name()));
        }
        for (source, target) in &sorted_relations {
            markup.push_str(&format!("    {} --> {}\n", source.name(), target.name()));
        }

        Some(auto_record(
            "layer-dependencies",
            "dependencies",
            "Layer Dependencies",
            "Observed cross-layer import relations",
            markup,
            70,
        ))
    }

    /// Per-file dependency graph up to the display ceiling; beyond it,
    /// files are grouped by path prefix so the node count stays bounded
    /// regardless of repository size.
    fn component_graph(&self, model: &CodebaseModel) -> DiagramRecord {
        if model.files.len() <= self.max_graph_nodes {
            self.per_file_graph(model)
        } else {
            self.aggregated_graph(model)
        }
    }

    fn per_file_graph(&self, model: &CodebaseModel) -> DiagramRecord {
        let mut markup = String::from("flowchart TD\n");

        for file in &model.files {
            let display = file.path.to_string_lossy().replace('\\', "/");
            markup.push_str(&format!(
                "    {}[\"{}\"]\n",
                node_id(&display),
                escape(&display)
            ));
        }
        for edge in &model.edges {
            markup.push_str(&format!(
                "    {} --> {}\n",
                node_id(&edge.source.to_string_lossy().replace('\\', "/")),
                node_id(&edge.target.to_string_lossy().replace('\\', "/"))
            ));
        }

        auto_record(
            "components",
            "dependencies",
            "Component Graph",
            "File-level dependency graph",
            markup,
            60,
        )
    }

    fn aggregated_graph(&self, model: &CodebaseModel) -> DiagramRecord {
        let groups = self.prefix_groups(model);

        let mut markup = String::from("flowchart TD\n");
        for (prefix, agg) in &groups {
            markup.push_str(&format!(
                "    {}[\"{} ({}, {} fn, {} cls, {})\"]\n",
                node_id(prefix),
                escape(prefix),
                file_count_label(agg.file_count),
                agg.function_count,
                agg.class_count,
                dominant_layer(&agg.layers).name()
            ));
        }

        // Lift file edges to group edges
        let assignment = self.group_assignment(model, &groups);
        let mut group_edges: BTreeSet<(String, String)> = BTreeSet::new();
        for edge in &model.edges {
            let (Some(source), Some(target)) = (
                assignment.get(&edge.source),
                assignment.get(&edge.target),
            ) else {
                continue;
            };
            if source != target {
                group_edges.insert((source.clone(), target.clone()));
            }
        }
        for (source, target) in &group_edges {
            markup.push_str(&format!(
                "    {} --> {}\n",
                node_id(source),
                node_id(target)
            ));
        }

        auto_record(
            "components",
            "dependencies",
            "Component Graph",
            "Directory-level dependency graph (aggregated for scale)",
            markup,
            60,
        )
    }

    /// Group files by fixed-depth path prefix, falling back to a shallower
    /// prefix and finally a largest-first truncation with an `(other)`
    /// bucket, so the group count always lands strictly under the ceiling.
    fn prefix_groups(&self, model: &CodebaseModel) -> BTreeMap<String, GroupAggregate> {
        for depth in [2usize, 1] {
            let groups = collect_groups(model, depth);
            if groups.len() < self.max_graph_nodes {
                return groups;
            }
        }

        let groups = collect_groups(model, 1);
        let mut ranked: Vec<(String, GroupAggregate)> = groups.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.file_count
                .cmp(&a.1.file_count)
                .then_with(|| a.0.cmp(&b.0))
        });

        let keep = self.max_graph_nodes.saturating_sub(2);
        let mut result: BTreeMap<String, GroupAggregate> =
            ranked.drain(..keep.min(ranked.len())).collect();

        let mut other = GroupAggregate::default();
        for (_, agg) in ranked {
            other.absorb(agg);
        }
        if other.file_count > 0 {
            result.insert("(other)".to_string(), other);
        }

        result
    }

    fn group_assignment(
        &self,
        model: &CodebaseModel,
        groups: &BTreeMap<String, GroupAggregate>,
    ) -> BTreeMap<PathBuf, String> {
        let mut assignment = BTreeMap::new();
        for file in &model.files {
            for depth in [2usize, 1] {
                let prefix = path_prefix(&file.path, depth);
                if groups.contains_key(&prefix) {
                    assignment.insert(file.path.clone(), prefix);
                    break;
                }
            }
            assignment
                .entry(file.path.clone())
                .or_insert_with(|| "(other)".to_string());
        }
        assignment
    }

    /// Best-effort request flows: one sequence per exported HTTP-verb-named
    /// function in an api-layer file, tracing its first few resolved
    /// dependencies.
    fn flows(&self, model: &CodebaseModel) -> Vec<DiagramRecord> {
        let mut entries: Vec<(&Path, &str)> = Vec::new();

        for file in &model.files {
            if model.layer_of(&file.path) != Layer::Api {
                continue;
            }
            for function in &file.functions {
                if function.is_exported && self.verb_re.is_match(&function.name) {
                    entries.push((file.path.as_path(), function.name.as_str()));
                }
            }
        }

        entries.sort();
        entries.truncate(self.max_flows);

        entries
            .into_iter()
            .map(|(path, name)| self.flow_diagram(model, path, name))
            .collect()
    }

    fn flow_diagram(&self, model: &CodebaseModel, path: &Path, name: &str) -> DiagramRecord {
        let display = path.to_string_lossy().replace('\\', "/");
        let entry_id = node_id(&display);

        let deps: Vec<String> = model
            .edges_from(path)
            .take(self.flow_fanout)
            .map(|e| e.target.to_string_lossy().replace('\\', "/"))
            .collect();

        let mut markup = String::from("sequenceDiagram\n");
        markup.push_str("    participant Client\n");
        markup.push_str(&format!("    participant {} as {}\n", entry_id, display));
        for dep in &deps {
            markup.push_str(&format!("    participant {} as {}\n", node_id(dep), dep));
        }

        markup.push_str(&format!("    Client->>{}: {}()\n", entry_id, name));
        for dep in &deps {
            markup.push_str(&format!("    {}->>{}: uses\n", entry_id, node_id(dep)));
            markup.push_str(&format!("    {}-->>{}: result\n", node_id(dep), entry_id));
        }
        markup.push_str(&format!("    {}-->>Client: response\n", entry_id));

        // The full path keeps ids unique when two entry files share a stem
        auto_record(
            &format!("flow-{}", node_id(&format!("{}-{}", display, name))),
            "flow",
            &format!("Flow: {}", name),
            &format!("Request flow traced from {} in {}", name, display),
            markup,
            50,
        )
    }
}

#[derive(Debug, Default, Clone)]
struct GroupAggregate {
    file_count: usize,
    function_count: usize,
    class_count: usize,
    layers: Vec<Layer>,
}

impl GroupAggregate {
    fn absorb(&mut self, other: GroupAggregate) {
        self.file_count += other.file_count;
        self.function_count += other.function_count;
        self.class_count += other.class_count;
        self.layers.extend(other.layers);
    }
}

fn collect_groups(model: &CodebaseModel, depth: usize) -> BTreeMap<String, GroupAggregate> {
    let mut groups: BTreeMap<String, GroupAggregate> = BTreeMap::new();

    for file in &model.files {
        let prefix = path_prefix(&file.path, depth);
        let agg = groups.entry(prefix).or_default();
        agg.file_count += 1;
        agg.function_count += file.functions.len();
        agg.class_count += file.classes.len();
        agg.layers.push(model.layer_of(&file.path));
    }

    groups
}

/// First `depth` directory segments of a path, or `(root)` for top-level
/// files.
fn path_prefix(path: &Path, depth: usize) -> String {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let segments: Vec<String> = parent
        .components()
        .take(depth)
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    if segments.is_empty() {
        "(root)".to_string()
    } else {
        segments.join("/")
    }
}

/// Mermaid-safe node identifier
fn node_id(text: &str) -> String {
    let mut id: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if id.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        id.insert(0, 'n');
    }
    id
}

fn escape(text: &str) -> String {
    text.replace('"', "'")
}

fn file_count_label(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", count)
    }
}

fn auto_record(
    id: &str,
    category: &str,
    title: &str,
    description: &str,
    markup: String,
    priority: i32,
) -> DiagramRecord {
    DiagramRecord {
        id: id.to_string(),
        category: category.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        markup,
        labels: vec![AUTO_LABEL.to_string()],
        priority,
    }
}
