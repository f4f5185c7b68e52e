//! Pattern syntax tree and copy-on-write mutations.
//!
//! Every node carries a `NodeId` handed out by a `NodeIdAllocator`. Ids
//! are never reused within an allocator. Children are `Arc`-shared: a
//! mutation rebuilds only the path from the root to the target and
//! reuses every untouched subtree, so the input tree stays valid.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Monotonic id source. Persist `peek()` alongside a tree to keep ids
/// unique across save/load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    // ── Constructors ────────────────────────────────

    pub fn sound(&mut self, sample: impl Into<String>) -> Tree {
        self.node(NodeKind::Sound { sample: sample.into() })
    }

    pub fn rest(&mut self) -> Tree {
        self.node(NodeKind::Rest)
    }

    pub fn sequence(&mut self, children: Vec<Tree>) -> Tree {
        self.node(NodeKind::Sequence(children))
    }

    pub fn stack(&mut self, children: Vec<Tree>) -> Tree {
        self.node(NodeKind::Stack(children))
    }

    pub fn repeat(&mut self, child: Tree, times: u32) -> Tree {
        self.node(NodeKind::Repeat { child, times })
    }

    pub fn euclidean(&mut self, child: Tree, pulses: u32, steps: u32, rotation: u32) -> Tree {
        self.node(NodeKind::Euclidean { child, pulses, steps, rotation })
    }

    pub fn effect(&mut self, child: Tree, effect: impl Into<String>, amount: f64) -> Tree {
        self.node(NodeKind::Effect { child, effect: effect.into(), amount })
    }

    fn node(&mut self, kind: NodeKind) -> Tree {
        Arc::new(Node { id: self.next_id(), kind })
    }
}

pub type Tree = Arc<Node>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id:   NodeId,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Sound { sample: String },
    Sequence(Vec<Tree>),
    Stack(Vec<Tree>),
    Repeat { child: Tree, times: u32 },
    Euclidean { child: Tree, pulses: u32, steps: u32, rotation: u32 },
    Effect { child: Tree, effect: String, amount: f64 },
    Rest,
}

impl Node {
    pub fn children(&self) -> Vec<&Tree> {
        match &self.kind {
            NodeKind::Sequence(c) | NodeKind::Stack(c) => c.iter().collect(),
            NodeKind::Repeat { child, .. }
            | NodeKind::Euclidean { child, .. }
            | NodeKind::Effect { child, .. } => vec![child],
            NodeKind::Sound { .. } | NodeKind::Rest => vec![],
        }
    }

    /// Depth-first search for `id`.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children().into_iter().find_map(|c| c.find(id))
    }

    /// All ids in depth-first pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = vec![self.id];
        for child in self.children() {
            out.extend(child.ids());
        }
        out
    }

    pub fn samples(&self) -> Vec<&str> {
        match &self.kind {
            NodeKind::Sound { sample } => vec![sample.as_str()],
            _ => self.children().into_iter().flat_map(|c| c.samples()).collect(),
        }
    }

    pub fn effects(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let NodeKind::Effect { effect, .. } = &self.kind {
            out.push(effect.as_str());
        }
        for child in self.children() {
            out.extend(child.effects());
        }
        out
    }

    pub fn contains_effect(&self) -> bool {
        matches!(self.kind, NodeKind::Effect { .. })
            || self.children().into_iter().any(|c| c.contains_effect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationKind {
    ReplaceLeaf { sample: String },
    WrapInRepeat { times: u32 },
    WrapInEffect { effect: String, amount: f64 },
    Euclidean { pulses: u32, steps: u32, rotation: u32 },
    Subdivide { parts: u32 },
    AppendRest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub target: NodeId,
    #[serde(flatten)]
    pub kind:   MutationKind,
}

const MAX_SUBDIVISION: u32 = 16;

/// Apply `mutation` and return the rewritten tree.
///
/// A missing target, or a mutation kind the target node does not accept,
/// returns the input tree unchanged (same `Arc`).
pub fn apply(tree: &Tree, mutation: &Mutation, alloc: &mut NodeIdAllocator) -> Tree {
    rewrite(tree, mutation, alloc).unwrap_or_else(|| Arc::clone(tree))
}

fn rewrite(node: &Tree, mutation: &Mutation, alloc: &mut NodeIdAllocator) -> Option<Tree> {
    if node.id == mutation.target {
        return rewrite_target(node, &mutation.kind, alloc);
    }

    let kind = match &node.kind {
        NodeKind::Sequence(children) => NodeKind::Sequence(rewrite_all(children, mutation, alloc)?),
        NodeKind::Stack(children) => NodeKind::Stack(rewrite_all(children, mutation, alloc)?),
        NodeKind::Repeat { child, times } => NodeKind::Repeat {
            child: rewrite(child, mutation, alloc)?,
            times: *times,
        },
        NodeKind::Euclidean { child, pulses, steps, rotation } => NodeKind::Euclidean {
            child:    rewrite(child, mutation, alloc)?,
            pulses:   *pulses,
            steps:    *steps,
            rotation: *rotation,
        },
        NodeKind::Effect { child, effect, amount } => NodeKind::Effect {
            child:  rewrite(child, mutation, alloc)?,
            effect: effect.clone(),
            amount: *amount,
        },
        NodeKind::Sound { .. } | NodeKind::Rest => return None,
    };
    Some(Arc::new(Node { id: node.id, kind }))
}

/// Rewrite the first child containing the target; share the rest.
fn rewrite_all(
    children: &[Tree],
    mutation: &Mutation,
    alloc: &mut NodeIdAllocator,
) -> Option<Vec<Tree>> {
    for (i, child) in children.iter().enumerate() {
        if let Some(replacement) = rewrite(child, mutation, alloc) {
            let mut out = children.to_vec();
            out[i] = replacement;
            return Some(out);
        }
    }
    None
}

fn rewrite_target(node: &Tree, kind: &MutationKind, alloc: &mut NodeIdAllocator) -> Option<Tree> {
    match (kind, &node.kind) {
        (MutationKind::ReplaceLeaf { sample }, NodeKind::Sound { .. }) => Some(Arc::new(Node {
            id:   node.id,
            kind: NodeKind::Sound { sample: sample.clone() },
        })),

        (MutationKind::WrapInRepeat { times }, _) if *times >= 2 => {
            Some(alloc.repeat(Arc::clone(node), *times))
        }

        (MutationKind::WrapInEffect { effect, amount }, _)
            if amount.is_finite() && !effect.is_empty() =>
        {
            Some(alloc.effect(Arc::clone(node), effect.clone(), *amount))
        }

        (
            MutationKind::Euclidean { pulses, steps, rotation },
            NodeKind::Sound { .. } | NodeKind::Repeat { .. },
        ) if valid_euclid(*pulses, *steps) => {
            Some(alloc.euclidean(Arc::clone(node), *pulses, *steps, *rotation % *steps))
        }

        (
            MutationKind::Euclidean { pulses, steps, rotation },
            NodeKind::Euclidean { child, .. },
        ) if valid_euclid(*pulses, *steps) => Some(Arc::new(Node {
            id:   node.id,
            kind: NodeKind::Euclidean {
                child:    Arc::clone(child),
                pulses:   *pulses,
                steps:    *steps,
                rotation: *rotation % *steps,
            },
        })),

        (MutationKind::Subdivide { parts }, NodeKind::Sound { sample })
            if (2..=MAX_SUBDIVISION).contains(parts) =>
        {
            let copies = (0..*parts).map(|_| alloc.sound(sample.clone())).collect();
            Some(Arc::new(Node { id: node.id, kind: NodeKind::Sequence(copies) }))
        }

        (MutationKind::AppendRest, NodeKind::Sequence(children)) => {
            let mut out = children.clone();
            out.push(alloc.rest());
            Some(Arc::new(Node { id: node.id, kind: NodeKind::Sequence(out) }))
        }

        _ => None,
    }
}

fn valid_euclid(pulses: u32, steps: u32) -> bool {
    steps > 0 && pulses > 0 && pulses <= steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree(alloc: &mut NodeIdAllocator) -> Tree {
        let bd = alloc.sound("bd");
        let rest = alloc.rest();
        let hh = alloc.sound("hh");
        let seq = alloc.sequence(vec![bd, rest]);
        alloc.stack(vec![seq, hh])
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let mut alloc = NodeIdAllocator::new();
        let tree = sample_tree(&mut alloc);
        let ids = tree.ids();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
        assert_eq!(alloc.peek(), 5);
    }

    #[test]
    fn replace_leaf_leaves_original_untouched() {
        let mut alloc = NodeIdAllocator::new();
        let tree = sample_tree(&mut alloc);
        let original = (*tree).clone();

        let mutated = apply(
            &tree,
            &Mutation { target: NodeId(0), kind: MutationKind::ReplaceLeaf { sample: "cp".into() } },
            &mut alloc,
        );

        assert_eq!(*tree, original);
        assert_eq!(mutated.samples(), vec!["cp", "hh"]);
        assert_eq!(tree.samples(), vec!["bd", "hh"]);
        assert_eq!(mutated.find(NodeId(0)).map(|n| &n.kind), Some(&NodeKind::Sound { sample: "cp".into() }));
    }

    #[test]
    fn untouched_subtrees_are_shared() {
        let mut alloc = NodeIdAllocator::new();
        let tree = sample_tree(&mut alloc);
        let mutated = apply(
            &tree,
            &Mutation { target: NodeId(0), kind: MutationKind::WrapInRepeat { times: 2 } },
            &mut alloc,
        );
        let (NodeKind::Stack(before), NodeKind::Stack(after)) = (&tree.kind, &mutated.kind) else {
            panic!("root should stay a stack");
        };
        assert!(Arc::ptr_eq(&before[1], &after[1]), "hh layer should be shared");
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        assert_eq!(mutated.id, tree.id);
    }

    #[test]
    fn inapplicable_mutation_is_a_no_op() {
        let mut alloc = NodeIdAllocator::new();
        let tree = sample_tree(&mut alloc);

        // AppendRest only applies to sequences; node 0 is a sound.
        let same = apply(
            &tree,
            &Mutation { target: NodeId(0), kind: MutationKind::AppendRest },
            &mut alloc,
        );
        assert!(Arc::ptr_eq(&same, &tree));

        // Missing target.
        let same = apply(
            &tree,
            &Mutation { target: NodeId(999), kind: MutationKind::WrapInRepeat { times: 2 } },
            &mut alloc,
        );
        assert!(Arc::ptr_eq(&same, &tree));
    }

    #[test]
    fn subdivide_and_append_rest() {
        let mut alloc = NodeIdAllocator::new();
        let tree = sample_tree(&mut alloc);
        let subdivided = apply(
            &tree,
            &Mutation { target: NodeId(2), kind: MutationKind::Subdivide { parts: 3 } },
            &mut alloc,
        );
        let node = subdivided.find(NodeId(2)).unwrap();
        assert!(matches!(&node.kind, NodeKind::Sequence(c) if c.len() == 3));

        let seq_id = NodeId(3);
        let extended = apply(
            &subdivided,
            &Mutation { target: seq_id, kind: MutationKind::AppendRest },
            &mut alloc,
        );
        let node = extended.find(seq_id).unwrap();
        assert!(matches!(&node.kind, NodeKind::Sequence(c) if c.len() == 3));
    }

    #[test]
    fn euclid_rejects_impossible_rhythms() {
        let mut alloc = NodeIdAllocator::new();
        let tree = alloc.sound("bd");
        let same = apply(
            &tree,
            &Mutation {
                target: tree.id,
                kind:   MutationKind::Euclidean { pulses: 9, steps: 8, rotation: 0 },
            },
            &mut alloc,
        );
        assert!(Arc::ptr_eq(&same, &tree));

        let euclid = apply(
            &tree,
            &Mutation {
                target: tree.id,
                kind:   MutationKind::Euclidean { pulses: 3, steps: 8, rotation: 10 },
            },
            &mut alloc,
        );
        assert!(matches!(
            euclid.kind,
            NodeKind::Euclidean { pulses: 3, steps: 8, rotation: 2, .. }
        ));
    }
}
