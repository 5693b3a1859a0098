//! Suggestion engine: mirrors the dispatcher's walk but stops at the
//! cursor instead of requiring a complete match (spec §4.G).
//!
//! The teacher has no tab-completion concept at all — `CommandArgument`
//! has no `suggest` hook and the dispatcher never forks the stream for
//! anything but execution. This module is the second consumer of the same
//! tree the dispatcher walks, which is the reason the tree and its parser
//! trait were built generic over "what happens once a token matches"
//! rather than baking dispatch-only behavior into `DynParameterType`.
use std::collections::HashSet;
use std::sync::Arc;

use crate::actor::Actor;
use crate::context::ExecutionContext;
use crate::stream::StringStream;
use crate::tree::{CommandTree, TreeNode};

/// Returns completions for `input` against `tree`, in first-seen order
/// with duplicates removed.
#[must_use]
pub fn suggest<A: Actor>(tree: &CommandTree<A>, input: &str, actor: &Arc<A>) -> Vec<String> {
    let ctx = ExecutionContext::new(Arc::clone(actor));
    let stream = StringStream::new(input);
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect(&tree.root, &stream, &ctx, &mut out, &mut seen);
    out
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, value: String) {
    if seen.insert(value.clone()) {
        out.push(value);
    }
}

fn collect<A: Actor>(
    node: &TreeNode<A>,
    stream: &StringStream,
    ctx: &ExecutionContext<A>,
    out: &mut Vec<String>,
    seen: &mut HashSet<String>,
) {
    let mut probe = stream.fork();
    probe.skip_whitespace();
    let remainder = probe.fork().read_remaining();
    let cursor_in_final_token = !remainder.trim_end().contains(char::is_whitespace);

    if cursor_in_final_token {
        let prefix_lower = remainder.to_ascii_lowercase();
        for literal in &node.literals {
            if literal.canonical.to_ascii_lowercase().starts_with(&prefix_lower) {
                push_unique(out, seen, literal.canonical.clone());
            }
        }
        for entry in &node.parameters {
            let provider = entry
                .spec
                .suggestion
                .clone()
                .or_else(|| entry.spec.parser.default_suggestions());
            if let Some(provider) = provider {
                for suggestion in provider.suggestions(probe.fork(), ctx) {
                    push_unique(out, seen, suggestion);
                }
            }
        }
        return;
    }

    let token_lower = probe.peek_token().to_ascii_lowercase();
    if let Some(literal) = node
        .literals
        .iter()
        .find(|l| l.lower_spellings.iter().any(|s| *s == token_lower))
    {
        let mut child_stream = stream.fork();
        child_stream.skip_whitespace();
        child_stream.read_unquoted_string();
        let mut child_ctx = ctx.clone();
        child_ctx.record_literal_match();
        collect(&literal.child, &child_stream, &child_ctx, out, seen);
    }

    for entry in &node.parameters {
        let mut child_stream = stream.fork();
        child_stream.skip_whitespace();
        if let Ok(value) = entry.spec.parser.parse_erased(&mut child_stream, ctx) {
            let mut child_ctx = ctx.clone();
            child_ctx.set(&entry.spec.name, Arc::from(value));
            collect(&entry.child, &child_stream, &child_ctx, out, seen);
        }
    }
}
