//! Ordered, de-duplicated, typed metadata attached to methods, parameters
//! and classes, plus the annotation-replacer fix-point.
//!
//! The teacher has no reflection-based annotation system (Rust has no
//! runtime introspection), so this component has no direct teacher
//! counterpart; it is grounded instead in the Design Notes' instruction to
//! model annotation replacement "as a fix-point over the annotation list
//! with a bounded iteration cap" and in the teacher's habit of keying
//! per-argument side state by a stable identity
//! (`SuggestionContext::parsed_values` in `command/arguments/mod.rs` keys
//! by `&'static str` name; here we key by [`TypeId`] since annotation
//! "kind" is a type, not a name).
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::sync::Arc;

/// Marker for a piece of typed metadata. Implementors are plain data
/// structs; the blanket impl below derives `kind()` from `TypeId::of::<Self>()`.
pub trait Annotation: Any + Send + Sync + 'static {
    /// Returns `self` as `&dyn Any` for downcasting out of the list.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + 'static> Annotation for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An ordered collection of annotations where each kind appears at most
/// once. New entries of an existing kind replace the old one, which is
/// what `with` gives the "copy-with-addition" semantics spec.md asks for.
#[derive(Clone, Default)]
pub struct AnnotationList {
    entries: Vec<(TypeId, Arc<dyn Annotation>)>,
}

impl AnnotationList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this list with `annotation` added (or replacing an
    /// existing entry of the same kind).
    #[must_use]
    pub fn with<T: Annotation>(&self, annotation: T) -> Self {
        let kind = TypeId::of::<T>();
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|(k, _)| *k != kind)
            .cloned()
            .collect();
        entries.push((kind, Arc::new(annotation)));
        Self { entries }
    }

    /// Typed lookup by kind.
    #[must_use]
    pub fn get<T: Annotation>(&self) -> Option<&T> {
        let kind = TypeId::of::<T>();
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, ann)| ann.as_any().downcast_ref::<T>())
    }

    /// Whether a kind is present.
    #[must_use]
    pub fn has<T: Annotation>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// Iterates the kinds present, in insertion order.
    pub fn kinds(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}

/// A function from an existing annotation of kind `K` to zero or more
/// substitute annotations. Registered against the replaced kind.
pub trait AnnotationReplacer<K: Annotation>: Send + Sync {
    /// Produces the substitute annotations for one instance of `K`.
    fn replace(&self, instance: &K) -> AnnotationList;
}

type ErasedReplacer = Arc<dyn Fn(&dyn Annotation) -> AnnotationList + Send + Sync>;

/// A registry of annotation replacers, keyed by the kind they replace.
#[derive(Clone, Default)]
pub struct ReplacerRegistry {
    replacers: Vec<(TypeId, ErasedReplacer)>,
}

impl ReplacerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a replacer for annotation kind `K`.
    pub fn register<K: Annotation, R: AnnotationReplacer<K> + 'static>(&mut self, replacer: R) {
        let kind = TypeId::of::<K>();
        let erased: ErasedReplacer = Arc::new(move |ann: &dyn Annotation| {
            ann.as_any()
                .downcast_ref::<K>()
                .map(|k| replacer.replace(k))
                .unwrap_or_default()
        });
        self.replacers.push((kind, erased));
    }

    /// Applies every registered replacer to `list` to a fixed point,
    /// bounded by `max_depth` rounds. A kind that has already been
    /// replaced once cannot be reintroduced by a later round (cycle
    /// prevention) — it is silently dropped from the round's output.
    #[must_use]
    pub fn resolve(&self, list: &AnnotationList, max_depth: usize) -> AnnotationList {
        let mut current = list.clone();
        let mut replaced_kinds: HashSet<TypeId> = HashSet::new();

        for _ in 0..max_depth {
            let mut changed = false;
            let mut next = AnnotationList::new();

            for (kind, ann) in &current.entries {
                if let Some((_, replacer)) = self.replacers.iter().find(|(k, _)| k == kind) {
                    changed = true;
                    replaced_kinds.insert(*kind);
                    let substitutes = replacer(ann.as_ref());
                    for (sub_kind, sub_ann) in substitutes.entries {
                        if replaced_kinds.contains(&sub_kind) && sub_kind == *kind {
                            // Cycle: the replacer reintroduced its own kind.
                            continue;
                        }
                        next.entries.retain(|(k, _)| *k != sub_kind);
                        next.entries.push((sub_kind, sub_ann));
                    }
                } else {
                    next.entries.retain(|(k, _)| *k != *kind);
                    next.entries.push((*kind, ann.clone()));
                }
            }

            current = next;
            if !changed {
                break;
            }
        }

        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Description(&'static str);

    #[derive(Clone)]
    struct Placeholder;

    struct PlaceholderToDescription;
    impl AnnotationReplacer<Placeholder> for PlaceholderToDescription {
        fn replace(&self, _instance: &Placeholder) -> AnnotationList {
            AnnotationList::new().with(Description("synthesized"))
        }
    }

    #[test]
    fn with_replaces_same_kind() {
        let list = AnnotationList::new()
            .with(Description("first"))
            .with(Description("second"));
        assert_eq!(list.get::<Description>().unwrap().0, "second");
        assert_eq!(list.kinds().count(), 1);
    }

    #[test]
    fn replacer_substitutes_and_stops_at_fixed_point() {
        let mut registry = ReplacerRegistry::new();
        registry.register::<Placeholder, _>(PlaceholderToDescription);

        let list = AnnotationList::new().with(Placeholder);
        let resolved = registry.resolve(&list, 8);

        assert!(!resolved.has::<Placeholder>());
        assert_eq!(resolved.get::<Description>().unwrap().0, "synthesized");
    }
}
