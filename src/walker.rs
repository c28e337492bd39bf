use crate::policy::{DetachedObjects, SanitizationPolicy};
use crate::record::{RemovalLog, RemovalSink, SanitizationResult};
use crate::{CleanerConfig, Result, ScrubError};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

// ── VisitedSet ───────────────────────────────────────────────────────────────

/// Indirect objects already walked during the current pass.
///
/// Only indirect objects have an identity. Inline dictionaries and arrays
/// belong to exactly one container and are covered by their owner's single
/// visit, and every cycle in a PDF passes through a reference.
#[derive(Debug, Default)]
pub(crate) struct VisitedSet {
    ids: HashSet<ObjectId>,
}

impl VisitedSet {
    /// Returns `true` if `id` had not been visited yet.
    pub(crate) fn insert(&mut self, id: ObjectId) -> bool {
        self.ids.insert(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

// ── SanitizerSession ─────────────────────────────────────────────────────────

/// Per-document traversal state: the visited set, the removal log and the
/// policy they feed. Created fresh for each document and consumed by
/// [`SanitizerSession::finish`].
pub(crate) struct SanitizerSession<'a> {
    policy: SanitizationPolicy,
    pub(crate) visited: VisitedSet,
    detached: DetachedObjects,
    log: RemovalLog<'a>,
}

impl<'a> SanitizerSession<'a> {
    pub(crate) fn new(config: &CleanerConfig, sink: Option<RemovalSink<'a>>) -> Self {
        Self {
            policy: SanitizationPolicy::new(config),
            visited: VisitedSet::default(),
            detached: DetachedObjects::default(),
            log: RemovalLog::new(sink),
        }
    }

    pub(crate) fn removals(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn finish(self) -> SanitizationResult {
        self.log.finish()
    }

    /// Walk any node. Leaves end the recursion.
    pub(crate) fn walk_object(
        &mut self,
        document: &mut Document,
        node: &mut Object,
        label: &str,
    ) -> Result<()> {
        match node {
            Object::Reference(id) => {
                let id = *id;
                self.walk_reference(document, id, label)
            }
            Object::Dictionary(dict) => self.walk_dictionary(document, dict, label),
            Object::Stream(stream) => self.walk_dictionary(document, &mut stream.dict, label),
            Object::Array(items) => self.walk_array(document, items, label),
            Object::Null
            | Object::Boolean(_)
            | Object::Integer(_)
            | Object::Real(_)
            | Object::Name(_)
            | Object::String(..) => Ok(()),
        }
    }

    /// Resolve `id` and walk its target unless it was already visited.
    ///
    /// The target is taken out of the object table while it is walked and put
    /// back afterwards, on the error path too. A reference reaching it again in
    /// the meantime finds it in the visited set and stops there; an `/A` entry
    /// pointing at it is resolved through [`DetachedObjects`].
    pub(crate) fn walk_reference(
        &mut self,
        document: &mut Document,
        id: ObjectId,
        label: &str,
    ) -> Result<()> {
        if !self.visited.insert(id) {
            log::trace!("({label}) {} {} R already visited", id.0, id.1);
            return Ok(());
        }

        let mut target = document
            .objects
            .remove(&id)
            .ok_or_else(|| ScrubError::missing_object(id))?;
        self.detached.detach(id, &target);
        let outcome = self.walk_object(document, &mut target, label);
        self.put_back(document, id, target);
        outcome
    }

    /// Apply the policy to `dict`, then walk every entry that is left.
    pub(crate) fn walk_dictionary(
        &mut self,
        document: &mut Document,
        dict: &mut Dictionary,
        label: &str,
    ) -> Result<()> {
        self.policy
            .apply(document, dict, label, &mut self.detached, &mut self.log);

        for (key, value) in dict.iter_mut() {
            let child = format!("{label} > {}", String::from_utf8_lossy(key));
            self.walk_object(document, value, &child)?;
        }
        Ok(())
    }

    /// Walk every element. Arrays are never deduplicated themselves.
    pub(crate) fn walk_array(
        &mut self,
        document: &mut Document,
        items: &mut [Object],
        label: &str,
    ) -> Result<()> {
        for (index, item) in items.iter_mut().enumerate() {
            self.walk_object(document, item, &format!("{label}[{index}]"))?;
        }
        Ok(())
    }

    /// Walk the trailer, which lives outside the object table.
    pub(crate) fn walk_trailer(&mut self, document: &mut Document) -> Result<()> {
        let mut trailer = std::mem::replace(&mut document.trailer, Dictionary::new());
        let outcome = self.walk_dictionary(document, &mut trailer, "Trailer");
        document.trailer = trailer;
        outcome
    }

    /// Walk the `/Kids` array of an already visited page dictionary.
    pub(crate) fn walk_page_kids(
        &mut self,
        document: &mut Document,
        page_id: ObjectId,
        label: &str,
    ) -> Result<()> {
        let Some(mut page) = document.objects.remove(&page_id) else {
            return Ok(());
        };
        self.detached.detach(page_id, &page);

        let outcome = match page.as_dict_mut().and_then(|dict| dict.get_mut(b"Kids")) {
            Ok(Object::Array(kids)) => self.walk_array(document, kids, label),
            Ok(Object::Reference(id)) => {
                let id = *id;
                self.walk_reference(document, id, label)
            }
            _ => Ok(()),
        };
        self.put_back(document, page_id, page);
        outcome
    }

    fn put_back(&mut self, document: &mut Document, id: ObjectId, mut object: Object) {
        self.detached.reattach(id, &mut object, &mut self.log);
        document.objects.insert(id, object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn shared_dictionary_is_sanitized_once() {
        let mut doc = Document::with_version("1.7");
        let shared = doc.add_object(dictionary! { "JS" => Object::string_literal("x()") });
        let mut root = Object::Array(vec![
            Object::Reference(shared),
            Object::Dictionary(dictionary! { "Next" => shared }),
            Object::Reference(shared),
        ]);

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_object(&mut doc, &mut root, "Root").unwrap();

        assert_eq!(session.visited.len(), 1);
        let result = session.finish();
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0].location, "Root[0]");
    }

    #[test]
    fn self_referencing_cycle_terminates() {
        let mut doc = Document::with_version("1.7");
        let a = doc.new_object_id();
        let b = doc.add_object(dictionary! { "Back" => a, "AA" => dictionary! {} });
        doc.objects
            .insert(a, Object::Dictionary(dictionary! { "Next" => b, "Self" => a }));

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_reference(&mut doc, a, "A").unwrap();

        assert_eq!(session.visited.len(), 2);
        let result = session.finish();
        assert_eq!(result.records()[0].location, "A > Next");
        assert_eq!(result.records()[0].key, "AA");
        assert!(doc.objects.contains_key(&a));
        assert!(doc.objects.contains_key(&b));
    }

    #[test]
    fn reference_chains_are_followed() {
        let mut doc = Document::with_version("1.7");
        let inner = doc.add_object(dictionary! { "OpenAction" => Object::Null });
        let outer = doc.add_object(Object::Reference(inner));

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_reference(&mut doc, outer, "Start").unwrap();

        assert_eq!(session.removals(), 1);
    }

    #[test]
    fn stream_dictionaries_are_sanitized() {
        let mut doc = Document::with_version("1.7");
        let stream = lopdf::Stream::new(
            dictionary! { "Type" => "EmbeddedFile", "EmbeddedFile" => Object::Null },
            b"payload".to_vec(),
        );
        let id = doc.add_object(stream);

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_reference(&mut doc, id, "Stream").unwrap();

        assert_eq!(session.removals(), 1);
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, b"payload");
    }

    #[test]
    fn missing_object_is_a_codec_failure() {
        let mut doc = Document::with_version("1.7");
        let mut node = Object::Dictionary(dictionary! { "Kids" => vec![Object::Reference((99, 0))] });

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        let err = session.walk_object(&mut doc, &mut node, "Pages").unwrap_err();

        assert!(matches!(
            err,
            ScrubError::MissingObject { number: 99, generation: 0 }
        ));
    }

    #[test]
    fn trailer_is_restored_after_walk() {
        let mut doc = Document::with_version("1.7");
        doc.trailer.set("OpenAction", Object::Null);
        doc.trailer.set("Size", Object::Integer(1));

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_trailer(&mut doc).unwrap();

        assert_eq!(session.finish().records()[0].location, "Trailer");
        assert!(doc.trailer.has(b"Size"));
        assert!(!doc.trailer.has(b"OpenAction"));
    }

    #[test]
    fn self_referencing_launch_action_is_neutralized() {
        let mut doc = Document::with_version("1.7");
        let action = doc.new_object_id();
        doc.objects.insert(
            action,
            Object::Dictionary(dictionary! {
                "S" => "Launch",
                "F" => Object::string_literal("evil.exe"),
                "A" => action,
            }),
        );

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_reference(&mut doc, action, "Page 1 > Foo").unwrap();

        let lines: Vec<_> = session.finish().records().iter().map(|r| r.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                format!("(Page 1 > Foo) A: {} 0 R", action.0),
                "(Page 1 > Foo > A) F: (evil.exe)".to_owned(),
            ]
        );
        let dict = doc.get_dictionary(action).unwrap();
        assert!(!dict.has(b"A"));
        assert!(!dict.has(b"F"));
        assert!(dict.has(b"S"));
    }

    #[test]
    fn launch_action_held_by_an_ancestor_is_neutralized() {
        let mut doc = Document::with_version("1.7");
        let launch = doc.new_object_id();
        let link = doc.add_object(dictionary! { "Subtype" => "Link", "A" => launch });
        doc.objects.insert(
            launch,
            Object::Dictionary(dictionary! {
                "S" => "Launch",
                "F" => Object::string_literal("evil.exe"),
                "Next" => link,
            }),
        );

        let mut session = SanitizerSession::new(&CleanerConfig::default(), None);
        session.walk_reference(&mut doc, launch, "Thumb").unwrap();

        let result = session.finish();
        assert_eq!(result.len(), 2);
        assert_eq!(result.records()[0].location, "Thumb > Next");
        assert_eq!(result.records()[0].key, "A");
        assert_eq!(result.records()[1].location, "Thumb > Next > A");
        assert_eq!(result.records()[1].key, "F");
        assert!(!doc.get_dictionary(link).unwrap().has(b"A"));
        assert!(!doc.get_dictionary(launch).unwrap().has(b"F"));
    }
}
