//! Incremental classifier trie.
//!
//! Level `i` of the trie splits by the boolean outcome of the `i`-th installed
//! classifier. Every leaf sits at the current depth and carries one separation
//! class, an ordered list of examples whose first member is the
//! representative.

use indexmap::IndexMap;

use crate::{
    error::{Result, UnifError},
    term::Term,
    workspace::ExampleId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

pub const ROOT: NodeId = NodeId(0);

/// Decides, for a trie level, on which side an example falls.
pub trait Classifier {
    fn classify(&mut self, level: usize, example: ExampleId) -> Result<bool>;
}

#[derive(Debug)]
enum TrieNode {
    Leaf(Vec<ExampleId>),
    // Indexed by the classifier outcome: `[false, true]`.
    Branch([Option<NodeId>; 2]),
}

/// Read-only view of one node.
pub enum Node<'a> {
    Leaf(&'a [ExampleId]),
    Branch { yes: Option<NodeId>, no: Option<NodeId> },
}

#[derive(Debug)]
pub struct ClassifierTrie {
    nodes: Vec<TrieNode>,
    reps: IndexMap<ExampleId, NodeId>,
    depth: usize,
}

impl Default for ClassifierTrie {
    fn default() -> Self {
        ClassifierTrie { nodes: vec![TrieNode::Leaf(Vec::new())], reps: IndexMap::new(), depth: 0 }
    }
}

impl ClassifierTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of classifiers installed so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Places `example` in the trie and returns the representative of its
    /// separation class. The result is `example` itself iff it opened a new
    /// class.
    pub fn add<C: Classifier>(
        &mut self,
        example: ExampleId,
        cls: &mut C,
        level: usize,
    ) -> Result<ExampleId> {
        if level != self.depth {
            return Err(UnifError::LevelMismatch { level, depth: self.depth });
        }
        let mut cur = ROOT;
        for lvl in 0..self.depth {
            let side = cls.classify(lvl, example)? as usize;
            let child = match &self.nodes[cur.0] {
                TrieNode::Branch(ch) => ch[side],
                TrieNode::Leaf(_) => {
                    return Err(UnifError::MalformedTrie { level: lvl, depth: self.depth })
                }
            };
            cur = match child {
                Some(next) => next,
                None => {
                    let fresh = if lvl + 1 == self.depth {
                        TrieNode::Leaf(Vec::new())
                    } else {
                        TrieNode::Branch([None, None])
                    };
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(fresh);
                    if let TrieNode::Branch(ch) = &mut self.nodes[cur.0] {
                        ch[side] = Some(id);
                    }
                    id
                }
            };
        }

        let depth = self.depth;
        let TrieNode::Leaf(class) = &mut self.nodes[cur.0] else {
            return Err(UnifError::MalformedTrie { level: depth, depth });
        };
        class.push(example);
        let rep = class[0];
        if rep == example {
            self.reps.insert(example, cur);
        }
        Ok(rep)
    }

    /// Deepens the trie by one level, splitting every class by classifier
    /// `index`. Members keep their relative order, so the first member of
    /// each new class becomes its representative.
    pub fn add_classifier<C: Classifier>(&mut self, cls: &mut C, index: usize) -> Result<()> {
        if index != self.depth {
            return Err(UnifError::LevelMismatch { level: index, depth: self.depth });
        }
        let mut splits = Vec::new();
        for (ix, node) in self.nodes.iter().enumerate() {
            if let TrieNode::Leaf(class) = node {
                let mut sides: [Vec<ExampleId>; 2] = Default::default();
                for m in class {
                    sides[cls.classify(index, *m)? as usize].push(*m);
                }
                splits.push((NodeId(ix), sides));
            }
        }

        for (leaf, sides) in splits {
            let mut children = [None, None];
            for (side, class) in sides.into_iter().enumerate() {
                if !class.is_empty() {
                    children[side] = Some(NodeId(self.nodes.len()));
                    self.nodes.push(TrieNode::Leaf(class));
                }
            }
            self.nodes[leaf.0] = TrieNode::Branch(children);
        }
        self.depth += 1;

        self.reps.clear();
        for (ix, node) in self.nodes.iter().enumerate() {
            if let TrieNode::Leaf(class) = node {
                if let Some(rep) = class.first() {
                    self.reps.insert(*rep, NodeId(ix));
                }
            }
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        match &self.nodes[id.0] {
            TrieNode::Leaf(class) => Node::Leaf(class),
            TrieNode::Branch([no, yes]) => Node::Branch { yes: *yes, no: *no },
        }
    }

    pub fn is_representative(&self, e: ExampleId) -> bool {
        self.reps.contains_key(&e)
    }

    pub fn class_of(&self, rep: ExampleId) -> Option<&[ExampleId]> {
        let id = self.reps.get(&rep)?;
        match &self.nodes[id.0] {
            TrieNode::Leaf(class) => Some(class),
            TrieNode::Branch(_) => None,
        }
    }

    pub fn representative_of(&self, e: ExampleId) -> Option<ExampleId> {
        self.classes().find(|class| class.contains(&e)).map(|class| class[0])
    }

    /// Separation classes, representatives first, in creation order.
    pub fn classes(&self) -> impl Iterator<Item = &[ExampleId]> + '_ {
        self.reps.values().filter_map(|id| match &self.nodes[id.0] {
            TrieNode::Leaf(class) => Some(class.as_slice()),
            TrieNode::Branch(_) => None,
        })
    }

    /// Whether every class agrees on the target value of its members.
    pub fn is_consistent(&self, targets: &IndexMap<ExampleId, Term>) -> bool {
        self.classes().all(|class| {
            let first = targets.get(&class[0]);
            class.iter().all(|m| targets.get(m) == first)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Level `i` reads bit `i` of the example id.
    struct Bits;

    impl Classifier for Bits {
        fn classify(&mut self, level: usize, example: ExampleId) -> Result<bool> {
            Ok(example.0 >> level & 1 == 1)
        }
    }

    fn ex(n: u32) -> ExampleId {
        ExampleId(n)
    }

    #[test]
    fn first_member_is_representative() {
        let mut trie = ClassifierTrie::new();
        assert_eq!(trie.add(ex(4), &mut Bits, 0), Ok(ex(4)));
        assert_eq!(trie.add(ex(6), &mut Bits, 0), Ok(ex(4)));
        assert_eq!(trie.class_of(ex(4)), Some(&[ex(4), ex(6)][..]));
        assert!(!trie.is_representative(ex(6)));
    }

    #[test]
    fn classifier_splits_every_class() {
        let mut trie = ClassifierTrie::new();
        for n in 0..4 {
            trie.add(ex(n), &mut Bits, 0).unwrap();
        }
        trie.add_classifier(&mut Bits, 0).unwrap();
        assert_eq!(trie.class_of(ex(0)), Some(&[ex(0), ex(2)][..]));
        assert_eq!(trie.class_of(ex(1)), Some(&[ex(1), ex(3)][..]));
        // New examples descend the installed level.
        assert_eq!(trie.add(ex(5), &mut Bits, 1), Ok(ex(1)));
        assert_eq!(trie.add(ex(4), &mut Bits, 0), Err(UnifError::LevelMismatch { level: 0, depth: 1 }));
    }

    #[test]
    fn malformed_shape_is_reported() {
        // A leaf where a branch is expected.
        let mut trie = ClassifierTrie::new();
        trie.depth = 1;
        assert_eq!(trie.add(ex(0), &mut Bits, 1), Err(UnifError::MalformedTrie { level: 0, depth: 1 }));

        // A branch at the bottom level.
        let mut trie = ClassifierTrie::new();
        trie.nodes[0] = TrieNode::Branch([None, None]);
        assert_eq!(trie.add(ex(0), &mut Bits, 0), Err(UnifError::MalformedTrie { level: 0, depth: 0 }));
        assert!(trie.classes().next().is_none());
    }

    #[test]
    fn separated_examples_stay_separated() {
        let mut trie = ClassifierTrie::new();
        for n in 0..8 {
            trie.add(ex(n), &mut Bits, 0).unwrap();
        }
        let mut previous: Vec<Option<ExampleId>> = (0..8).map(|_| Some(ex(0))).collect();
        for level in 0..3 {
            trie.add_classifier(&mut Bits, level).unwrap();
            let reps: Vec<_> = (0..8).map(|n| trie.representative_of(ex(n))).collect();
            for a in 0..8 {
                for b in 0..8 {
                    if previous[a] != previous[b] {
                        assert_ne!(reps[a], reps[b]);
                    }
                }
            }
            previous = reps;
        }
        assert_eq!(trie.classes().count(), 8);
    }

    #[test]
    fn levels_are_created_on_demand() {
        let mut trie = ClassifierTrie::new();
        trie.add_classifier(&mut Bits, 0).unwrap();
        trie.add_classifier(&mut Bits, 1).unwrap();
        assert_eq!(trie.classes().count(), 0);
        assert_eq!(trie.add(ex(3), &mut Bits, 2), Ok(ex(3)));
        assert_eq!(trie.add(ex(7), &mut Bits, 2), Ok(ex(3)));
        assert_eq!(trie.add(ex(1), &mut Bits, 2), Ok(ex(1)));
        match trie.node(ROOT) {
            Node::Branch { yes, no } => {
                assert!(yes.is_some());
                assert!(no.is_none());
            }
            Node::Leaf(_) => panic!("root should branch"),
        }
    }

    #[test]
    fn clear_resets_depth() {
        let mut trie = ClassifierTrie::new();
        trie.add(ex(1), &mut Bits, 0).unwrap();
        trie.add_classifier(&mut Bits, 0).unwrap();
        trie.clear();
        assert_eq!(trie.depth(), 0);
        assert_eq!(trie.classes().count(), 0);
    }
}
