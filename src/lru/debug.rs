//! Diagnostics and structural self-checks for the list-augmented engine.

use super::engine::LruOrdTree;
use crate::error::{GroveError, Result};
use crate::types::{Color, Comparator, NodeIndex};
use std::cmp::Ordering;
use std::fmt::Write as _;

impl<T, C> LruOrdTree<T, C>
where
    C: Comparator<T>,
{
    /// One-line state summary for logs, including list ends and mode.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "grove-lru[{}] size={}/{} root={} min={} max={} head={} tail={} lru={} free={}",
            self.segment_id(),
            self.len(),
            self.capacity(),
            self.root(),
            self.first(),
            self.last(),
            self.pool.header().list_head(),
            self.pool.header().list_tail(),
            self.lru_enabled(),
            self.pool.free_chain_len(),
        )
    }

    /// Render the tree shape as indented ASCII, one node per line.
    #[must_use]
    pub fn dump_structure(&self) -> String
    where
        T: std::fmt::Debug,
    {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.summary());
        self.dump_subtree(&mut out, self.root(), 0);
        out
    }

    fn dump_subtree(&self, out: &mut String, idx: NodeIndex, depth: usize)
    where
        T: std::fmt::Debug,
    {
        if idx.is_invalid() {
            return;
        }
        let links = self.pool.links(idx);
        let tag = match links.color() {
            Color::Red => "R",
            Color::Black => "B",
        };
        let _ = writeln!(
            out,
            "{:indent$}{} {} {:?}",
            "",
            idx,
            tag,
            self.pool.value(idx),
            indent = depth * 2
        );
        self.dump_subtree(out, links.left, depth + 1);
        self.dump_subtree(out, links.right, depth + 1);
    }

    /// Render every slot's raw link state, including list threading.
    #[must_use]
    pub fn dump_nodes(&self) -> String {
        let mut out = String::new();
        for i in 0..=self.capacity() {
            let idx = NodeIndex::new(i);
            let links = self.pool.links(idx);
            let order = &self.pool.node(idx).order;
            let _ = writeln!(
                out,
                "{}: parent={} left={} right={} prev={} next={} color={:?} in_use={}{}",
                idx,
                links.parent,
                links.left,
                links.right,
                order.prev,
                order.next,
                links.color(),
                links.in_use(),
                if idx == self.end() { " (sentinel)" } else { "" },
            );
        }
        out
    }

    /// Verify every structural invariant of both the tree and the list.
    ///
    /// On top of the plain-engine checks, the order list must thread
    /// exactly the live elements with mutually consistent prev/next
    /// links. Returns `E007` naming the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let end = self.end();
        let root = self.root();

        let sentinel = self.pool.links(end);
        if !sentinel.in_use() || sentinel.own != end {
            return self.violation("sentinel slot is damaged".to_string());
        }

        if root.is_invalid() {
            if self.len() != 0 {
                return self.violation(format!("empty tree but size is {}", self.len()));
            }
            if sentinel.left != end || sentinel.right != end {
                return self.violation("empty tree but min/max cache is set".to_string());
            }
        } else {
            if self.pool.links(root).color() != Color::Black {
                return self.violation(format!("root {} is red", root));
            }
            if self.pool.links(root).parent != end {
                return self.violation(format!("root {} is not anchored at the sentinel", root));
            }
        }

        let mut count = 0u32;
        if !root.is_invalid() {
            self.check_subtree(root, &mut count)?;
        }
        if count != self.len() {
            return self.violation(format!(
                "tree holds {} nodes but size is {}",
                count,
                self.len()
            ));
        }

        if !root.is_invalid() {
            if sentinel.left != self.subtree_min(root) {
                return self.violation("minimum cache is stale".to_string());
            }
            if sentinel.right != self.subtree_max(root) {
                return self.violation("maximum cache is stale".to_string());
            }

            let mut cur = self.first();
            let mut next = self.successor(cur);
            while next != end {
                if self.cmp.compare(self.pool.value(cur), self.pool.value(next))
                    == Ordering::Greater
                {
                    return self.violation(format!("{} and {} are out of order", cur, next));
                }
                cur = next;
                next = self.successor(cur);
            }
        }

        self.check_list()?;

        let expected_free = self.capacity() - self.len();
        let mut free = 0u32;
        let mut idx = self.pool.header().free_start();
        while !idx.is_invalid() {
            if free >= expected_free {
                return self.violation("free chain is longer than capacity - size".to_string());
            }
            if self.pool.links(idx).in_use() {
                return self.violation(format!("free chain reaches live slot {}", idx));
            }
            free += 1;
            idx = self.pool.links(idx).right;
        }
        if free != expected_free {
            return self.violation(format!(
                "free chain holds {} slots, expected {}",
                free, expected_free
            ));
        }

        Ok(())
    }

    /// Walk the order list and verify threading.
    fn check_list(&self) -> Result<()> {
        let head = self.pool.header().list_head();
        let tail = self.pool.header().list_tail();

        if head.is_invalid() != tail.is_invalid() {
            return self.violation(format!(
                "list ends disagree: head={} tail={}",
                head, tail
            ));
        }

        let mut threaded = 0u32;
        let mut prev = NodeIndex::INVALID;
        let mut cur = head;
        while !cur.is_invalid() {
            if threaded >= self.len() {
                return self.violation("order list threads more nodes than are live".to_string());
            }
            if !self.is_live(cur) {
                return self.violation(format!("order list reaches non-live slot {}", cur));
            }
            let order = &self.pool.node(cur).order;
            if order.prev != prev {
                return self.violation(format!(
                    "{} has prev {}, expected {}",
                    cur, order.prev, prev
                ));
            }
            prev = cur;
            cur = order.next;
            threaded += 1;
        }

        if threaded != self.len() {
            return self.violation(format!(
                "order list threads {} nodes but {} elements are live",
                threaded,
                self.len()
            ));
        }
        if prev != tail {
            return self.violation(format!("list tail is {}, walk ended at {}", tail, prev));
        }
        Ok(())
    }

    fn check_subtree(&self, idx: NodeIndex, count: &mut u32) -> Result<u32> {
        let links = self.pool.links(idx);
        if !links.in_use() {
            return self.violation(format!("tree reaches free slot {}", idx));
        }
        if links.own != idx {
            return self.violation(format!("slot {} carries self index {}", idx, links.own));
        }
        *count += 1;

        let left = links.left;
        let right = links.right;
        let color = links.color();

        for child in [left, right] {
            if child.is_invalid() {
                continue;
            }
            if !self.pool.in_bounds(child) || child == self.end() {
                return self.violation(format!("{} links to bad child {}", idx, child));
            }
            if self.pool.links(child).parent != idx {
                return self.violation(format!(
                    "{} does not link back to its parent {}",
                    child, idx
                ));
            }
            if color == Color::Red && self.pool.links(child).color() == Color::Red {
                return self.violation(format!("red {} has red child {}", idx, child));
            }
        }

        let left_height = if left.is_invalid() {
            1
        } else {
            self.check_subtree(left, count)?
        };
        let right_height = if right.is_invalid() {
            1
        } else {
            self.check_subtree(right, count)?
        };
        if left_height != right_height {
            return self.violation(format!(
                "black height differs under {}: {} vs {}",
                idx, left_height, right_height
            ));
        }

        Ok(left_height + u32::from(color == Color::Black))
    }

    fn violation<U>(&self, cause: String) -> Result<U> {
        tracing::warn!(segment = %self.segment_id(), %cause, "invariant violation");
        Err(GroveError::InvariantViolation { cause })
    }
}
