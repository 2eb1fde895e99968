//! Red-black rebalancing for the plain engine.
//!
//! Rotations and fixups work purely on [`Links`](crate::pool::Links)
//! indices; payloads never move. The root's parent is the sentinel slot,
//! so "is root" tests compare against `end()` rather than a null parent,
//! and absent children are `INVALID` and count as black.

use super::engine::OrdTree;
use crate::types::{Color, Comparator, NodeIndex};

impl<T, C> OrdTree<T, C>
where
    C: Comparator<T>,
{
    fn color_of(&self, idx: NodeIndex) -> Color {
        if idx.is_invalid() {
            Color::Black
        } else {
            self.pool.links(idx).color()
        }
    }

    fn set_color(&mut self, idx: NodeIndex, color: Color) {
        if !idx.is_invalid() {
            self.pool.links_mut(idx).set_color(color);
        }
    }

    /// Rotate the subtree at `x` leftward; `x.right` must exist.
    pub(super) fn rotate_left(&mut self, x: NodeIndex) {
        let y = self.pool.links(x).right;
        debug_assert!(!y.is_invalid(), "rotate_left requires a right child");

        let y_left = self.pool.links(y).left;
        self.pool.links_mut(x).right = y_left;
        if !y_left.is_invalid() {
            self.pool.links_mut(y_left).parent = x;
        }

        let x_parent = self.pool.links(x).parent;
        self.pool.links_mut(y).parent = x_parent;
        if x_parent == self.end() {
            self.pool.links_mut(self.end()).parent = y;
        } else if self.pool.links(x_parent).left == x {
            self.pool.links_mut(x_parent).left = y;
        } else {
            self.pool.links_mut(x_parent).right = y;
        }

        self.pool.links_mut(y).left = x;
        self.pool.links_mut(x).parent = y;
    }

    /// Rotate the subtree at `x` rightward; `x.left` must exist.
    pub(super) fn rotate_right(&mut self, x: NodeIndex) {
        let y = self.pool.links(x).left;
        debug_assert!(!y.is_invalid(), "rotate_right requires a left child");

        let y_right = self.pool.links(y).right;
        self.pool.links_mut(x).left = y_right;
        if !y_right.is_invalid() {
            self.pool.links_mut(y_right).parent = x;
        }

        let x_parent = self.pool.links(x).parent;
        self.pool.links_mut(y).parent = x_parent;
        if x_parent == self.end() {
            self.pool.links_mut(self.end()).parent = y;
        } else if self.pool.links(x_parent).right == x {
            self.pool.links_mut(x_parent).right = y;
        } else {
            self.pool.links_mut(x_parent).left = y;
        }

        self.pool.links_mut(y).right = x;
        self.pool.links_mut(x).parent = y;
    }

    /// Restore red-black invariants after linking the red node `z`.
    pub(super) fn insert_fixup(&mut self, mut z: NodeIndex) {
        while {
            let parent = self.pool.links(z).parent;
            parent != self.end() && self.color_of(parent) == Color::Red
        } {
            let parent = self.pool.links(z).parent;
            let grand = self.pool.links(parent).parent;

            if parent == self.pool.links(grand).left {
                let uncle = self.pool.links(grand).right;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    if z == self.pool.links(parent).right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.pool.links(z).parent;
                    let grand = self.pool.links(parent).parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.pool.links(grand).left;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    if z == self.pool.links(parent).left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.pool.links(z).parent;
                    let grand = self.pool.links(parent).parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_left(grand);
                }
            }
        }

        let root = self.root();
        self.set_color(root, Color::Black);
    }

    /// Restore red-black invariants after removing a black node.
    ///
    /// `x` is the node that moved into the removed position and may be
    /// absent (`INVALID`), so its parent is carried alongside.
    pub(super) fn erase_fixup(&mut self, mut x: NodeIndex, mut x_parent: NodeIndex) {
        while x != self.root() && self.color_of(x) == Color::Black {
            if x_parent == self.end() {
                break;
            }

            if x == self.pool.links(x_parent).left {
                let mut sibling = self.pool.links(x_parent).right;
                if self.color_of(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(x_parent, Color::Red);
                    self.rotate_left(x_parent);
                    sibling = self.pool.links(x_parent).right;
                }

                let s_left = self.pool.links(sibling).left;
                let s_right = self.pool.links(sibling).right;
                if self.color_of(s_left) == Color::Black && self.color_of(s_right) == Color::Black {
                    self.set_color(sibling, Color::Red);
                    x = x_parent;
                    x_parent = self.pool.links(x).parent;
                } else {
                    if self.color_of(s_right) == Color::Black {
                        self.set_color(s_left, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.pool.links(x_parent).right;
                    }
                    let parent_color = self.color_of(x_parent);
                    self.set_color(sibling, parent_color);
                    self.set_color(x_parent, Color::Black);
                    let s_right = self.pool.links(sibling).right;
                    self.set_color(s_right, Color::Black);
                    self.rotate_left(x_parent);
                    x = self.root();
                    break;
                }
            } else {
                let mut sibling = self.pool.links(x_parent).left;
                if self.color_of(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(x_parent, Color::Red);
                    self.rotate_right(x_parent);
                    sibling = self.pool.links(x_parent).left;
                }

                let s_left = self.pool.links(sibling).left;
                let s_right = self.pool.links(sibling).right;
                if self.color_of(s_left) == Color::Black && self.color_of(s_right) == Color::Black {
                    self.set_color(sibling, Color::Red);
                    x = x_parent;
                    x_parent = self.pool.links(x).parent;
                } else {
                    if self.color_of(s_left) == Color::Black {
                        self.set_color(s_right, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.pool.links(x_parent).left;
                    }
                    let parent_color = self.color_of(x_parent);
                    self.set_color(sibling, parent_color);
                    self.set_color(x_parent, Color::Black);
                    let s_left = self.pool.links(sibling).left;
                    self.set_color(s_left, Color::Black);
                    self.rotate_right(x_parent);
                    x = self.root();
                    break;
                }
            }
        }

        self.set_color(x, Color::Black);
    }
}
