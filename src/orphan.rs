//! Orphan commands: declarations whose path is unknown at ingestion time
//! and supplied only at registration, from runtime data (spec §4.K).
//!
//! The teacher has nothing like this — every command tree in
//! `commands/mod.rs` is wired at compile time with a literal path. This is
//! grounded directly in the annotation fix-point machinery built for the
//! Design Notes' reflection-replacement requirement
//! ([`crate::annotations::ReplacerRegistry`]): an orphan is ingested
//! carrying an [`OrphanPlaceholder`] marker annotation, and registration
//! substitutes it for a synthesized [`OrphanPath`] annotation once the
//! caller supplies the real path.
use crate::actor::Actor;
use crate::declaration::{CommandPath, MethodDeclaration, PathSegment};
use crate::error::CommandError;

/// Marks a [`MethodDeclaration`] as an orphan: it must be bound to a
/// runtime-supplied path via [`bind_runtime_path`] before registration,
/// rather than carrying a path of its own.
pub struct OrphanPlaceholder;

/// Synthesized in place of [`OrphanPlaceholder`] once a runtime path is
/// bound, recording what that path was.
pub struct OrphanPath(pub String);

/// Binds `runtime_path` onto an orphan declaration, replacing its
/// placeholder annotation with the synthesized [`OrphanPath`] and
/// rewriting its path list to the single bound path.
///
/// Fails if `declaration` was never marked with [`OrphanPlaceholder`], or
/// if `runtime_path` is malformed or itself contains a `<name>`
/// placeholder (orphan paths are plain literal sequences; there is no
/// source of declared parameters to bind a placeholder against).
pub fn bind_runtime_path<A: Actor>(
    mut declaration: MethodDeclaration<A>,
    runtime_path: &str,
) -> Result<MethodDeclaration<A>, CommandError> {
    if !declaration.annotations.has::<OrphanPlaceholder>() {
        return Err(CommandError::Custom(
            "declaration was not marked as an orphan command".into(),
        ));
    }

    let parsed = CommandPath::parse(runtime_path)?;
    if parsed.segments.iter().any(|s| matches!(s, PathSegment::Placeholder(_))) {
        return Err(CommandError::MalformedPath {
            path: runtime_path.to_string(),
        });
    }

    declaration.paths = vec![runtime_path.to_string()];
    declaration.annotations = declaration.annotations.with(OrphanPath(runtime_path.to_string()));
    Ok(declaration)
}
