//! # Comment Tree
//!
//! Comments are stored flat with an optional parent pointer. For display the
//! flat, chronologically sorted list is folded into a forest in two passes:
//! index every comment, then attach each one to its parent (or the root list
//! when the parent is not part of the set).
//!
//! Nesting is bounded by [`MAX_REPLY_DEPTH`]. New replies past that depth are
//! refused when posted; chains already deeper than that in storage are
//! flattened on read so dropping or serializing a forest never recurses
//! more than the cap.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Comment, CommentNode};

/// Deepest level a reply may sit at; roots are level 0.
pub const MAX_REPLY_DEPTH: usize = 32;

/// Builds the reply forest for one chapter.
///
/// `comments` must be sorted by creation time ascending; sibling order and
/// root order follow input order. A comment whose parent is missing from
/// the input becomes a root. Every input comment appears exactly once.
/// A reply that would land below [`MAX_REPLY_DEPTH`] is attached to its
/// ancestor one level above the cap instead, in chronological order among
/// that ancestor's replies.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let count = comments.len();
    let index: HashMap<Uuid, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut parent_of: Vec<Option<usize>> = vec![None; count];
    let mut roots: Vec<usize> = Vec::new();

    for (i, comment) in comments.iter().enumerate() {
        match comment.parent_id.and_then(|p| index.get(&p).copied()) {
            Some(parent) if parent != i => {
                children[parent].push(i);
                parent_of[i] = Some(parent);
            }
            _ => roots.push(i),
        }
    }

    let mut reached = vec![false; count];
    let mut preorder = Vec::with_capacity(count);
    for &root in &roots {
        visit(root, &children, &mut reached, &mut preorder);
    }

    // Anything still unreached sits on a parent cycle. Cut the earliest
    // member loose as a root so the whole cycle hangs below it.
    let mut promoted = false;
    for i in 0..count {
        if reached[i] {
            continue;
        }
        if let Some(parent) = parent_of[i].take() {
            children[parent].retain(|&c| c != i);
        }
        roots.push(i);
        promoted = true;
        visit(i, &children, &mut reached, &mut preorder);
    }
    if promoted {
        roots.sort_unstable();
    }

    // Re-attach in preorder so every parent's level is known before its
    // replies. Below the cap a reply joins its parent's parent, which sits
    // one level above the cap as well.
    let mut depth = vec![0usize; count];
    let mut attach_to: Vec<Option<usize>> = vec![None; count];
    let mut flattened = false;
    for &i in &preorder {
        let Some(parent) = parent_of[i] else { continue };
        if depth[parent] < MAX_REPLY_DEPTH {
            attach_to[i] = Some(parent);
            depth[i] = depth[parent] + 1;
        } else {
            attach_to[i] = attach_to[parent];
            depth[i] = depth[parent];
            flattened = true;
        }
    }
    if flattened {
        for list in children.iter_mut() {
            list.clear();
        }
        for &i in &preorder {
            if let Some(anchor) = attach_to[i] {
                children[anchor].push(i);
            }
        }
        // input order is chronological order
        for list in children.iter_mut() {
            list.sort_unstable();
        }
    }

    let mut slots: Vec<Option<CommentNode>> = comments
        .into_iter()
        .map(|comment| {
            Some(CommentNode {
                comment,
                replies: Vec::new(),
            })
        })
        .collect();

    // Reverse preorder finishes every child before its parent.
    for &i in preorder.iter().rev() {
        let replies: Vec<CommentNode> = children[i]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        if let Some(node) = slots[i].as_mut() {
            node.replies = replies;
        }
    }

    roots.into_iter().filter_map(|i| slots[i].take()).collect()
}

fn visit(start: usize, children: &[Vec<usize>], reached: &mut [bool], preorder: &mut Vec<usize>) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if reached[i] {
            continue;
        }
        reached[i] = true;
        preorder.push(i);
        stack.extend(children[i].iter().rev().copied());
    }
}

/// Total number of comments in a forest, replies included.
pub fn forest_size(forest: &[CommentNode]) -> usize {
    forest.iter().map(CommentNode::size).sum()
}
