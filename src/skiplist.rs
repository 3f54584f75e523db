use rand::Rng;

/// Maximum node height.
const MAX_LEVEL: usize = 32;
/// Probability of promoting a node one more level.
const PROBABILITY: f64 = 0.25;

/// Arena slot of the head sentinel.
const HEAD: usize = 0;

/// Ordered index over (score, member) pairs.
///
/// Nodes live in an arena and link to each other by slot index, so there is
/// no shared ownership between levels: the forward pointers of the chain are
/// plain indices and freed slots are recycled through a free list. Ordering
/// is score ascending, ties broken by byte-wise member comparison. Level 0
/// additionally maintains backward links and a tail index for reverse
/// traversal.
pub struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    level: usize,
    len: usize,
    tail: Option<usize>,
}

struct Node {
    member: String,
    score: f64,
    forward: Vec<Option<usize>>,
    backward: Option<usize>,
}

impl SkipList {
    pub fn new() -> SkipList {
        SkipList {
            nodes: vec![Node {
                member: String::new(),
                score: 0.0,
                forward: vec![None; MAX_LEVEL],
                backward: None,
            }],
            free: Vec::new(),
            level: 1,
            len: 0,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a (score, member) pair, returning whether the pair was new.
    ///
    /// Inserting the exact pair already present is a no-op. If the search
    /// lands on the same member under a different score, the old pair is
    /// removed and the new one inserted so the ordering invariant holds.
    pub fn insert(&mut self, score: f64, member: &str) -> bool {
        debug_assert!(!score.is_nan());

        let mut update = self.find_update(score, member);

        if let Some(found) = self.nodes[update[0]].forward[0] {
            let node = &self.nodes[found];
            if node.member == member {
                if node.score == score {
                    return false;
                }
                let old_score = node.score;
                self.remove(old_score, member);
                self.insert(score, member);
                return false;
            }
        }

        let height = random_level();
        if height > self.level {
            for slot in update.iter_mut().take(height).skip(self.level) {
                *slot = HEAD;
            }
            self.level = height;
        }

        let index = self.alloc(Node {
            member: member.to_owned(),
            score,
            forward: vec![None; height],
            backward: None,
        });

        for level in 0..height {
            self.nodes[index].forward[level] = self.nodes[update[level]].forward[level];
            self.nodes[update[level]].forward[level] = Some(index);
        }

        self.nodes[index].backward = (update[0] != HEAD).then_some(update[0]);
        match self.nodes[index].forward[0] {
            Some(next) => self.nodes[next].backward = Some(index),
            None => self.tail = Some(index),
        }

        self.len += 1;
        true
    }

    /// Removes the exact (score, member) pair. Returns false when absent.
    pub fn remove(&mut self, score: f64, member: &str) -> bool {
        let update = self.find_update(score, member);

        let target = match self.nodes[update[0]].forward[0] {
            Some(index)
                if self.nodes[index].member == member && self.nodes[index].score == score =>
            {
                index
            }
            _ => return false,
        };

        for level in 0..self.level {
            if self.nodes[update[level]].forward[level] != Some(target) {
                break;
            }
            self.nodes[update[level]].forward[level] = self.nodes[target].forward[level];
        }

        match self.nodes[target].forward[0] {
            Some(next) => self.nodes[next].backward = self.nodes[target].backward,
            None => self.tail = self.nodes[target].backward,
        }

        while self.level > 1 && self.nodes[HEAD].forward[self.level - 1].is_none() {
            self.level -= 1;
        }

        self.free.push(target);
        self.len -= 1;
        true
    }

    /// Returns the pairs with rank in `[start, stop]`, both inclusive.
    ///
    /// Bounds must already be normalized: `start <= stop` and `start < len`.
    /// Traversal walks the level-0 chain from the first ranked node.
    pub fn range(&self, start: usize, stop: usize) -> Vec<(String, f64)> {
        debug_assert!(start <= stop);

        let mut result = Vec::with_capacity(stop - start + 1);

        let mut current = self.nodes[HEAD].forward[0];
        for _ in 0..start {
            match current {
                Some(index) => current = self.nodes[index].forward[0],
                None => return result,
            }
        }

        let mut rank = start;
        while let Some(index) = current {
            if rank > stop {
                break;
            }
            let node = &self.nodes[index];
            result.push((node.member.clone(), node.score));
            current = node.forward[0];
            rank += 1;
        }

        result
    }

    /// Returns the pairs whose score lies in `[min, max]`, in index order or,
    /// with `rev`, walking the backward chain from the last in-range node.
    pub fn range_by_score(&self, min: f64, max: f64, rev: bool) -> Vec<(String, f64)> {
        let mut result = Vec::new();

        if rev {
            let mut current = HEAD;
            for level in (0..self.level).rev() {
                while let Some(next) = self.nodes[current].forward[level] {
                    if self.nodes[next].score <= max {
                        current = next;
                    } else {
                        break;
                    }
                }
            }

            let mut current = (current != HEAD).then_some(current);
            while let Some(index) = current {
                let node = &self.nodes[index];
                if node.score < min {
                    break;
                }
                result.push((node.member.clone(), node.score));
                current = node.backward;
            }
        } else {
            let mut current = HEAD;
            for level in (0..self.level).rev() {
                while let Some(next) = self.nodes[current].forward[level] {
                    if self.nodes[next].score < min {
                        current = next;
                    } else {
                        break;
                    }
                }
            }

            let mut current = self.nodes[current].forward[0];
            while let Some(index) = current {
                let node = &self.nodes[index];
                if node.score > max {
                    break;
                }
                result.push((node.member.clone(), node.score));
                current = node.forward[0];
            }
        }

        result
    }

    /// Iterates all pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        std::iter::successors(self.nodes[HEAD].forward[0], |&index| {
            self.nodes[index].forward[0]
        })
        .map(|index| (self.nodes[index].member.as_str(), self.nodes[index].score))
    }

    /// Iterates all pairs in reverse index order via the backward chain.
    pub fn iter_rev(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        std::iter::successors(self.tail, |&index| self.nodes[index].backward)
            .map(|index| (self.nodes[index].member.as_str(), self.nodes[index].score))
    }

    /// Walks each level down collecting, per level, the rightmost node that
    /// still precedes the (score, member) search key.
    fn find_update(&self, score: f64, member: &str) -> [usize; MAX_LEVEL] {
        let mut update = [HEAD; MAX_LEVEL];
        let mut current = HEAD;

        for level in (0..self.level).rev() {
            while let Some(next) = self.nodes[current].forward[level] {
                let node = &self.nodes[next];
                if node.score < score || (node.score == score && node.member.as_str() < member) {
                    current = next;
                } else {
                    break;
                }
            }
            update[level] = current;
        }

        update
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                index
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

fn random_level() -> usize {
    let mut rng = rand::rng();
    let mut level = 1;
    while level < MAX_LEVEL && rng.random::<f64>() < PROBABILITY {
        level += 1;
    }
    level
}
