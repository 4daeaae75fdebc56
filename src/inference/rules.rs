//! Derivation rules. Each is a pure function from a snapshot to the edges it
//! implies; nothing here touches a store.

use std::collections::{BTreeMap, BTreeSet};

use crate::mapper::{AST, HAS, IDENTIFIES, SIM};
use crate::model::*;

use super::snapshot::GraphSnapshot;

pub const INSTANCE_OF: &str = "InstanceOf";
pub const BELONGS: &str = "Belongs";
pub const SELECTS: &str = "Selects";
pub const REPRESENTS: &str = "Represents";

const MODEL_INST: [&str; 2] = [SIM, "ModelInst"];
const ANY_MODEL_INST: [&str; 1] = ["ModelInst"];
const MODEL: [&str; 2] = [SIM, "Model"];
const CHANNEL: [&str; 2] = [SIM, "Channel"];
const SIMBUS_CHANNEL: [&str; 2] = [SIM, "SimbusChannel"];
const SELECTOR: [&str; 2] = [SIM, "Selector"];
const LABEL: [&str; 2] = [SIM, "Label"];
const SIGNAL_GROUP: [&str; 2] = [SIM, "SignalGroup"];
const AST_MODEL_INST: [&str; 2] = [AST, "ModelInst"];
const AST_CHANNEL: [&str; 2] = [AST, "SimulationChannel"];

/// An edge a rule wants to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeProposal {
    pub start: NodeId,
    pub end: NodeId,
    pub rel_type: &'static str,
}

impl EdgeProposal {
    pub fn new(start: NodeId, end: NodeId, rel_type: &'static str) -> Self {
        Self { start, end, rel_type }
    }
}

/// Pairs `(a, b)` where `a.left_key == b.right_key`, one proposal per pair.
fn join_on(
    snap: &GraphSnapshot,
    left: &[&str],
    left_key: &str,
    right: &[&str],
    right_key: &str,
    rel_type: &'static str,
) -> Vec<EdgeProposal> {
    let mut by_key: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for node in snap.labelled(right) {
        if let Some(key) = node.get_str(right_key) {
            by_key.entry(key).or_default().push(node.id);
        }
    }
    let by_key = &by_key;

    snap.labelled(left)
        .filter_map(|node| node.get_str(left_key).map(|key| (node.id, key)))
        .flat_map(move |(id, key)| {
            by_key.get(key)
                .into_iter()
                .flatten()
                .map(move |&other| EdgeProposal::new(id, other, rel_type))
        })
        .collect()
}

/// `ModelInst -InstanceOf-> Model` on `ModelInst.model == Model.name`.
/// Instances of both namespaces join. Model names are not unique: one edge
/// per matching Model.
pub fn instance_of(snap: &GraphSnapshot) -> Vec<EdgeProposal> {
    join_on(snap, &ANY_MODEL_INST, "model", &MODEL, "name", INSTANCE_OF)
}

/// `Channel -Belongs-> SimbusChannel` on equal `name`.
pub fn belongs(snap: &GraphSnapshot) -> Vec<EdgeProposal> {
    join_on(snap, &CHANNEL, "name", &SIMBUS_CHANNEL, "name", BELONGS)
}

/// `Selector -Selects-> Label` when the selector tag equals the label.
///
/// Only selectors held by a model instance and labels held by a signal
/// group take part. Counts are compared per (group, selector, label,
/// instance) combination, which is always one to one, so every tag match
/// qualifies; the count gate that matters lives in [`represents`].
pub fn selects(snap: &GraphSnapshot) -> Vec<EdgeProposal> {
    let mut labels: BTreeMap<(&str, &str), Vec<NodeId>> = BTreeMap::new();
    for label in snap.labelled(&LABEL) {
        if snap.inc(label.id, HAS, &SIGNAL_GROUP).next().is_none() {
            continue;
        }
        if let (Some(name), Some(value)) = (label.get_str("label_name"), label.get_str("label_value")) {
            labels.entry((name, value)).or_default().push(label.id);
        }
    }

    let mut out = BTreeSet::new();
    for selector in snap.labelled(&SELECTOR) {
        if snap.inc(selector.id, HAS, &MODEL_INST).next().is_none() {
            continue;
        }
        let (Some(name), Some(value)) = (selector.get_str("selectorName"), selector.get_str("selectorValue")) else {
            continue;
        };
        for &label in labels.get(&(name, value)).into_iter().flatten() {
            out.insert(EdgeProposal::new(selector.id, label, SELECTS));
        }
    }
    out.into_iter().collect()
}

/// Selectors of `instance` grouped by the Channel they identify.
///
/// Both the instance's own selectors and those inherited through
/// `InstanceOf -> Model -Has->` count; a selector reachable both ways
/// counts once.
pub fn channel_selectors(snap: &GraphSnapshot, instance: NodeId) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
    let direct = snap.out(instance, HAS, &SELECTOR);
    let inherited = snap.out(instance, INSTANCE_OF, &MODEL)
        .flat_map(|model| snap.out(model, HAS, &SELECTOR));
    let selectors: BTreeSet<NodeId> = direct.chain(inherited).collect();

    let mut by_channel: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for selector in selectors {
        for channel in snap.out(selector, IDENTIFIES, &CHANNEL) {
            by_channel.entry(channel).or_default().insert(selector);
        }
    }
    by_channel
}

/// Number of `Selector -Selects-> Label <-Has- group` paths per group,
/// over the given selectors.
pub fn label_counts(snap: &GraphSnapshot, selectors: &BTreeSet<NodeId>) -> BTreeMap<NodeId, usize> {
    let mut counts = BTreeMap::new();
    for &selector in selectors {
        for label in snap.out(selector, SELECTS, &LABEL) {
            for group in snap.inc(label, HAS, &SIGNAL_GROUP) {
                *counts.entry(group).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Groups that satisfy every selector: `labelCount >= selectorCount`.
/// A group with extra, unmatched labels still qualifies.
pub fn qualifying_groups(selector_count: usize, label_counts: &BTreeMap<NodeId, usize>) -> Vec<NodeId> {
    label_counts.iter()
        .filter(|&(_, &count)| count >= selector_count)
        .map(|(&group, _)| group)
        .collect()
}

/// `Channel -Represents-> SignalGroup`, evaluated per model instance.
pub fn represents(snap: &GraphSnapshot) -> Vec<EdgeProposal> {
    let mut out = BTreeSet::new();
    for instance in snap.labelled(&MODEL_INST) {
        for (channel, selectors) in channel_selectors(snap, instance.id) {
            let counts = label_counts(snap, &selectors);
            for group in qualifying_groups(selectors.len(), &counts) {
                out.insert(EdgeProposal::new(channel, group, REPRESENTS));
            }
        }
    }
    out.into_iter().collect()
}

/// `Sim:ModelInst -Represents-> Ast:ModelInst` on `ast.model_name == sim.name`.
pub fn model_inst_bridge(snap: &GraphSnapshot) -> Vec<EdgeProposal> {
    join_on(snap, &MODEL_INST, "name", &AST_MODEL_INST, "model_name", REPRESENTS)
}

/// `Sim:Channel -Represents-> Ast:SimulationChannel` on `ast.channel_name == sim.name`.
pub fn channel_bridge(snap: &GraphSnapshot) -> Vec<EdgeProposal> {
    join_on(snap, &CHANNEL, "name", &AST_CHANNEL, "channel_name", REPRESENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Small graph builder over plain data.
    #[derive(Default)]
    struct Fixture {
        nodes: Vec<Node>,
        rels: Vec<Relationship>,
    }

    impl Fixture {
        fn node(&mut self, labels: &[&str], props: &[(&str, &str)]) -> NodeId {
            let id = NodeId(self.nodes.len() as u64 + 1);
            let mut node = Node::new(id).with_labels(labels.iter().copied());
            for (k, v) in props {
                node = node.with_property(*k, *v);
            }
            self.nodes.push(node);
            id
        }

        fn edge(&mut self, src: NodeId, dst: NodeId, rel_type: &str) {
            let id = RelId(self.rels.len() as u64 + 1);
            self.rels.push(Relationship::new(id, src, dst, rel_type));
        }

        fn group(&mut self, name: &str, labels: &[(&str, &str)]) -> NodeId {
            let group = self.node(&SIGNAL_GROUP, &[("name", name)]);
            for &(k, v) in labels {
                let label = self.node(&LABEL, &[("label_name", k), ("label_value", v)]);
                self.edge(group, label, HAS);
            }
            group
        }

        /// A model instance with selectors on one channel; returns (instance, channel).
        fn instance(&mut self, name: &str, channel: &str, selectors: &[(&str, &str)]) -> (NodeId, NodeId) {
            let mi = self.node(&MODEL_INST, &[("name", name)]);
            let ch = self.node(&CHANNEL, &[("name", channel)]);
            for &(k, v) in selectors {
                let sel = self.node(&SELECTOR, &[
                    ("channelName", channel),
                    ("selectorName", k),
                    ("selectorValue", v),
                ]);
                self.edge(mi, sel, HAS);
                self.edge(sel, ch, IDENTIFIES);
            }
            (mi, ch)
        }

        fn snapshot(self) -> GraphSnapshot {
            GraphSnapshot::new(self.nodes, self.rels)
        }
    }

    fn apply(snap: &mut GraphSnapshot, proposals: &[EdgeProposal]) {
        for p in proposals {
            snap.link(p.start, p.end, p.rel_type);
        }
    }

    fn infer_represents(snap: &mut GraphSnapshot) -> Vec<EdgeProposal> {
        let selects = selects(snap);
        apply(snap, &selects);
        represents(snap)
    }

    #[test]
    fn test_represents_exact_match() {
        let mut fx = Fixture::default();
        let group = fx.group("scalar", &[("a", "1"), ("b", "2")]);
        let (_, channel) = fx.instance("input", "physical", &[("a", "1"), ("b", "2")]);
        let mut snap = fx.snapshot();

        assert_eq!(
            infer_represents(&mut snap),
            vec![EdgeProposal::new(channel, group, REPRESENTS)]
        );
    }

    #[test]
    fn test_represents_allows_extra_group_labels() {
        let mut fx = Fixture::default();
        let group = fx.group("scalar", &[("a", "1"), ("b", "2")]);
        let (_, channel) = fx.instance("input", "physical", &[("a", "1")]);
        let mut snap = fx.snapshot();

        assert_eq!(
            infer_represents(&mut snap),
            vec![EdgeProposal::new(channel, group, REPRESENTS)]
        );
    }

    #[test]
    fn test_represents_requires_every_selector() {
        let mut fx = Fixture::default();
        fx.group("scalar", &[("a", "1")]);
        fx.instance("input", "physical", &[("a", "1"), ("b", "2")]);
        let mut snap = fx.snapshot();

        assert!(infer_represents(&mut snap).is_empty());
    }

    #[test]
    fn test_inherited_selectors_count_once() {
        let mut fx = Fixture::default();
        let group = fx.group("scalar", &[("a", "1")]);
        let (mi, channel) = fx.instance("input", "physical", &[("a", "1")]);
        let model = fx.node(&MODEL, &[("name", "linear")]);
        fx.edge(mi, model, INSTANCE_OF);
        // The model holds the same selector node the instance does.
        let selector = NodeId(5);
        fx.edge(model, selector, HAS);
        let mut snap = fx.snapshot();

        let by_channel = channel_selectors(&snap, mi);
        assert_eq!(by_channel[&channel].len(), 1);
        assert_eq!(
            infer_represents(&mut snap),
            vec![EdgeProposal::new(channel, group, REPRESENTS)]
        );
    }

    #[test]
    fn test_selects_ignores_unowned_nodes() {
        let mut fx = Fixture::default();
        // Label not held by any group
        fx.node(&LABEL, &[("label_name", "a"), ("label_value", "1")]);
        // Selector not held by any instance
        fx.node(&SELECTOR, &[("selectorName", "a"), ("selectorValue", "1")]);
        assert!(selects(&fx.snapshot()).is_empty());
    }

    #[test]
    fn test_instance_of_multiplicity() {
        let mut fx = Fixture::default();
        let mi = fx.node(&MODEL_INST, &[("name", "input"), ("model", "linear")]);
        let m1 = fx.node(&MODEL, &[("name", "linear")]);
        let m2 = fx.node(&[SIM, "Model", "Extra"], &[("name", "linear")]);
        fx.node(&MODEL, &[("name", "other")]);

        assert_eq!(
            instance_of(&fx.snapshot()),
            vec![
                EdgeProposal::new(mi, m1, INSTANCE_OF),
                EdgeProposal::new(mi, m2, INSTANCE_OF),
            ]
        );
    }

    #[test]
    fn test_instance_of_includes_ast_instances() {
        let mut fx = Fixture::default();
        let model = fx.node(&MODEL, &[("name", "linear")]);
        let ast_mi = fx.node(&AST_MODEL_INST, &[("model_name", "input"), ("model", "linear")]);
        fx.node(&AST_MODEL_INST, &[("model_name", "bare")]);

        assert_eq!(
            instance_of(&fx.snapshot()),
            vec![EdgeProposal::new(ast_mi, model, INSTANCE_OF)]
        );
    }

    #[test]
    fn test_belongs_and_bridges() {
        let mut fx = Fixture::default();
        let ch = fx.node(&CHANNEL, &[("name", "physical")]);
        let bus = fx.node(&SIMBUS_CHANNEL, &[("name", "physical")]);
        let ast_ch = fx.node(&AST_CHANNEL, &[("channel_name", "physical")]);
        let mi = fx.node(&MODEL_INST, &[("name", "input")]);
        let ast_mi = fx.node(&AST_MODEL_INST, &[("model_name", "input")]);
        let snap = fx.snapshot();

        assert_eq!(belongs(&snap), vec![EdgeProposal::new(ch, bus, BELONGS)]);
        assert_eq!(channel_bridge(&snap), vec![EdgeProposal::new(ch, ast_ch, REPRESENTS)]);
        assert_eq!(model_inst_bridge(&snap), vec![EdgeProposal::new(mi, ast_mi, REPRESENTS)]);
    }

    fn tag_set() -> impl Strategy<Value = BTreeMap<String, String>> {
        prop::collection::btree_map("[a-c]", "[1-2]", 0..3)
    }

    proptest! {
        /// A channel represents a group exactly when the group carries every
        /// selector tag the instance declared for that channel.
        #[test]
        fn prop_represents_iff_selectors_subset_of_labels(
            selectors in tag_set(),
            labels in tag_set(),
        ) {
            let mut fx = Fixture::default();
            let label_refs: Vec<(&str, &str)> = labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let selector_refs: Vec<(&str, &str)> = selectors.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            fx.group("g", &label_refs);
            fx.instance("mi", "physical", &selector_refs);
            let mut snap = fx.snapshot();

            let expected = !selectors.is_empty()
                && selectors.iter().all(|(k, v)| labels.get(k) == Some(v));
            prop_assert_eq!(!infer_represents(&mut snap).is_empty(), expected);
        }

        #[test]
        fn prop_qualifying_groups_respect_threshold(
            selector_count in 0usize..5,
            counts in prop::collection::vec(0usize..5, 0..6),
        ) {
            let label_counts: BTreeMap<NodeId, usize> = counts.iter().enumerate()
                .map(|(i, &c)| (NodeId(i as u64), c))
                .collect();
            let groups = qualifying_groups(selector_count, &label_counts);
            for (id, count) in &label_counts {
                prop_assert_eq!(groups.contains(id), *count >= selector_count);
            }
        }
    }
}
