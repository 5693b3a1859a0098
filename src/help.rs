//! Help introspection: children, siblings and related-command enumeration,
//! plus bounds-checked pagination (spec §4.L).
//!
//! The teacher has no structured help system — `CommandDispatcher` never
//! walks its own tree for anything but dispatch. This generalizes the
//! only read-only tree traversal the teacher does have, the `split on
//! whitespace and walk down" used by `handle_command` itself, into a
//! traversal that stops short of a leaf and reports what it finds instead
//! of executing it.
use crate::actor::Actor;
use crate::error::CommandError;
use crate::tree::{CommandTree, TreeNode};

/// One entry in a help listing: a literal child reachable from wherever
/// the listing was rooted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// This child's own spelling (not the full path).
    pub label: String,
    /// The full path to reach this child from the tree root.
    pub full_path: String,
}

fn find_node<'a, A: Actor>(tree: &'a CommandTree<A>, path: &str) -> Option<&'a TreeNode<A>> {
    let mut node = &tree.root;
    if path.trim().is_empty() {
        return Some(node);
    }
    for token in path.split_whitespace() {
        let lower = token.to_ascii_lowercase();
        let entry = node
            .literals
            .iter()
            .find(|l| l.lower_spellings.iter().any(|s| *s == lower))?;
        node = &entry.child;
    }
    Some(node)
}

fn direct_children<A: Actor>(node: &TreeNode<A>, path: &str) -> Vec<HelpEntry> {
    node.literals
        .iter()
        .map(|l| HelpEntry {
            label: l.canonical.clone(),
            full_path: if path.is_empty() {
                l.canonical.clone()
            } else {
                format!("{path} {}", l.canonical)
            },
        })
        .collect()
}

/// Lists the literal commands directly reachable one segment below
/// `path` (e.g. `children(tree, "quest")` lists `create`/`delete`/...).
/// Returns an empty list if `path` doesn't resolve to any node.
#[must_use]
pub fn children<A: Actor>(tree: &CommandTree<A>, path: &str) -> Vec<HelpEntry> {
    find_node(tree, path)
        .map(|node| direct_children(node, path))
        .unwrap_or_default()
}

/// Lists the other literal commands under `path`'s immediate parent,
/// excluding `path` itself. Returns an empty list for the root or for an
/// unresolvable path.
#[must_use]
pub fn siblings<A: Actor>(tree: &CommandTree<A>, path: &str) -> Vec<HelpEntry> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let Some(own) = tokens.pop() else {
        return Vec::new();
    };
    let parent_path = tokens.join(" ");
    let own_lower = own.to_ascii_lowercase();

    children(tree, &parent_path)
        .into_iter()
        .filter(|entry| entry.label.to_ascii_lowercase() != own_lower)
        .collect()
}

/// The union of [`children`] and [`siblings`] for `path`, de-duplicated
/// by full path while preserving the order children were found in.
#[must_use]
pub fn related<A: Actor>(tree: &CommandTree<A>, path: &str) -> Vec<HelpEntry> {
    let mut seen = std::collections::HashSet::new();
    children(tree, path)
        .into_iter()
        .chain(siblings(tree, path))
        .filter(|entry| seen.insert(entry.full_path.clone()))
        .collect()
}

/// Returns the `page`-th slice of `items`, `per_page` entries at a time
/// (zero-indexed). Fails with a descriptive [`CommandError::Custom`] if
/// `per_page` is zero or `page` has no entries.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Result<&[T], CommandError> {
    if per_page == 0 {
        return Err(CommandError::Custom("page size must be non-zero".into()));
    }
    let start = page.saturating_mul(per_page);
    if start >= items.len() {
        if page == 0 {
            return Ok(&[]);
        }
        return Err(CommandError::Custom(format!(
            "page {page} is out of range ({} item(s) total)",
            items.len()
        )));
    }
    let end = (start + per_page).min(items.len());
    Ok(&items[start..end])
}
