use crate::record::RemovalLog;
use crate::CleanerConfig;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Keys removed from every visited dictionary, in removal order.
pub const REMOVED_KEYS: [&str; 7] = [
    "JavaScript",
    "JS",
    "AA",
    "OpenAction",
    "FileAttachment",
    "EmbeddedFile",
    "EmbeddedFiles",
];

/// Key of an action dictionary attached to annotations and outline items.
pub const ACTION_KEY: &str = "A";

/// Action subtype (`/S`) that runs an external program or opens a file.
pub const LAUNCH_ACTION: &str = "Launch";

/// The removal rules applied once to every visited dictionary.
///
/// Removal is the only mutation: entries that match no rule are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SanitizationPolicy {
    strip_all_actions: bool,
}

impl SanitizationPolicy {
    pub(crate) fn new(config: &CleanerConfig) -> Self {
        Self {
            strip_all_actions: config.strip_all_actions,
        }
    }

    /// Apply every rule to `dict`, logging removals under `label`.
    ///
    /// `document` and `detached` are only used to resolve an `/A` entry stored
    /// as an indirect reference; `dict` itself must not be borrowed from
    /// `document`.
    pub(crate) fn apply(
        &self,
        document: &mut Document,
        dict: &mut Dictionary,
        label: &str,
        detached: &mut DetachedObjects,
        log: &mut RemovalLog<'_>,
    ) {
        for key in REMOVED_KEYS {
            log.take(label, dict, key.as_bytes());
        }
        self.neutralize_action(document, dict, label, detached, log);
    }

    /// Strip the file and Windows parameters of a `/Launch` action, then drop
    /// the `/A` entry from its parent.
    ///
    /// Non-launch actions are kept unless `strip_all_actions` is set. An action
    /// that is taken out of the object table further up the walk is judged by
    /// its `/S` and its own entries are stripped when it is put back.
    fn neutralize_action(
        &self,
        document: &mut Document,
        dict: &mut Dictionary,
        label: &str,
        detached: &mut DetachedObjects,
        log: &mut RemovalLog<'_>,
    ) {
        let action_label = format!("{label} > {ACTION_KEY}");
        let is_launch = match dict.get_mut(ACTION_KEY.as_bytes()) {
            Ok(Object::Dictionary(action)) => strip_if_launch(&action_label, action, log),
            Ok(Object::Reference(id)) => {
                let id = *id;
                match document.objects.get_mut(&id) {
                    Some(Object::Dictionary(action)) => {
                        strip_if_launch(&action_label, action, log)
                    }
                    Some(_) => return,
                    None => match detached.defer_launch_strip(id, action_label) {
                        Some(is_launch) => is_launch,
                        None => return,
                    },
                }
            }
            _ => return,
        };

        if is_launch || self.strip_all_actions {
            log.take(label, dict, ACTION_KEY.as_bytes());
        }
    }
}

fn is_launch(action: &Dictionary) -> bool {
    matches!(
        action.get(b"S"),
        Ok(Object::Name(name)) if name.as_slice() == LAUNCH_ACTION.as_bytes()
    )
}

/// Remove `/F` and `/Win` from `action` if it is a launch action.
fn strip_if_launch(label: &str, action: &mut Dictionary, log: &mut RemovalLog<'_>) -> bool {
    if !is_launch(action) {
        return false;
    }
    log.take(label, action, b"F");
    log.take(label, action, b"Win");
    true
}

// ── DetachedObjects ──────────────────────────────────────────────────────────

/// Dictionaries taken out of the object table while their subtree is walked.
///
/// An `/A` entry can point back at one of them (itself or an ancestor on the
/// walk). `/S` is never removed, so the launch check is made when the object
/// is taken out; stripping its `/F` and `/Win` waits until it is put back.
#[derive(Debug, Default)]
pub(crate) struct DetachedObjects {
    entries: HashMap<ObjectId, Detached>,
}

#[derive(Debug)]
struct Detached {
    is_launch: bool,
    pending: Vec<String>,
}

impl DetachedObjects {
    pub(crate) fn detach(&mut self, id: ObjectId, object: &Object) {
        if let Object::Dictionary(dict) = object {
            self.entries.insert(
                id,
                Detached {
                    is_launch: is_launch(dict),
                    pending: Vec::new(),
                },
            );
        }
    }

    /// Apply the strips queued for `id` while it was out.
    pub(crate) fn reattach(&mut self, id: ObjectId, object: &mut Object, log: &mut RemovalLog<'_>) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        if let Object::Dictionary(action) = object {
            for label in entry.pending {
                strip_if_launch(&label, action, log);
            }
        }
    }

    /// `None` if `id` is not a detached dictionary.
    fn defer_launch_strip(&mut self, id: ObjectId, label: String) -> Option<bool> {
        let entry = self.entries.get_mut(&id)?;
        if entry.is_launch {
            entry.pending.push(label);
        }
        Some(entry.is_launch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RemovalRecord;
    use lopdf::dictionary;

    fn apply(policy: SanitizationPolicy, doc: &mut Document, dict: &mut Dictionary) -> Vec<String> {
        let mut lines = Vec::new();
        let mut sink = |r: &RemovalRecord| lines.push(r.to_string());
        let mut log = RemovalLog::new(Some(&mut sink));
        policy.apply(doc, dict, "Annot", &mut DetachedObjects::default(), &mut log);
        drop(log);
        lines
    }

    #[test]
    fn removes_fixed_keys_in_order() {
        let mut doc = Document::with_version("1.7");
        let mut dict = dictionary! {
            "EmbeddedFiles" => Object::Reference((3, 0)),
            "Type" => "Catalog",
            "JS" => Object::string_literal("app.alert(1)"),
            "OpenAction" => Object::Null,
        };

        let lines = apply(SanitizationPolicy::default(), &mut doc, &mut dict);

        assert_eq!(
            lines,
            vec![
                r"(Annot) JS: (app.alert\(1\))",
                "(Annot) OpenAction: null",
                "(Annot) EmbeddedFiles: 3 0 R",
            ]
        );
        assert_eq!(dict.len(), 1);
        assert!(dict.has(b"Type"));
    }

    #[test]
    fn launch_action_is_stripped_and_removed() {
        let mut doc = Document::with_version("1.7");
        let mut dict = dictionary! {
            "Subtype" => "Link",
            "A" => dictionary! {
                "S" => "Launch",
                "F" => Object::string_literal("launch.exe"),
                "Win" => dictionary! { "F" => Object::string_literal("cmd.exe") },
            },
        };

        let lines = apply(SanitizationPolicy::default(), &mut doc, &mut dict);

        assert_eq!(
            lines,
            vec![
                "(Annot > A) F: (launch.exe)",
                "(Annot > A) Win: <</F (cmd.exe)>>",
                "(Annot) A: <</S /Launch>>",
            ]
        );
        assert!(!dict.has(b"A"));
        assert!(dict.has(b"Subtype"));
    }

    #[test]
    fn indirect_launch_action_is_resolved() {
        let mut doc = Document::with_version("1.7");
        let action_id = doc.add_object(dictionary! {
            "S" => "Launch",
            "F" => Object::string_literal("run.bat"),
        });
        let mut dict = dictionary! { "A" => action_id };

        let lines = apply(SanitizationPolicy::default(), &mut doc, &mut dict);

        assert_eq!(lines.len(), 2);
        assert!(!dict.has(b"A"));
        let action = doc.get_dictionary(action_id).unwrap();
        assert!(!action.has(b"F"));
        assert!(action.has(b"S"));
    }

    #[test]
    fn other_actions_are_kept_by_default() {
        let mut doc = Document::with_version("1.7");
        let mut dict = dictionary! {
            "A" => dictionary! { "S" => "URI", "URI" => Object::string_literal("https://example.org") },
        };

        let lines = apply(SanitizationPolicy::default(), &mut doc, &mut dict);

        assert!(lines.is_empty());
        assert!(dict.has(b"A"));
    }

    #[test]
    fn strip_all_actions_removes_any_action_dictionary() {
        let mut doc = Document::with_version("1.7");
        let mut dict = dictionary! {
            "A" => dictionary! { "S" => "GoTo", "D" => Object::Array(vec![]) },
        };
        let policy = SanitizationPolicy::new(&CleanerConfig {
            strip_all_actions: true,
            ..Default::default()
        });

        let lines = apply(policy, &mut doc, &mut dict);

        assert_eq!(lines, vec!["(Annot) A: <</S /GoTo /D []>>"]);
        assert!(dict.is_empty());
    }

    #[test]
    fn detached_launch_action_is_stripped_when_put_back() {
        let mut doc = Document::with_version("1.7");
        let action_id = (7, 0);
        let mut action = Object::Dictionary(dictionary! {
            "S" => "Launch",
            "F" => Object::string_literal("evil.exe"),
        });
        let mut detached = DetachedObjects::default();
        detached.detach(action_id, &action);

        let mut lines = Vec::new();
        let mut sink = |r: &RemovalRecord| lines.push(r.to_string());
        let mut log = RemovalLog::new(Some(&mut sink));
        let mut link = dictionary! { "Subtype" => "Link", "A" => action_id };
        SanitizationPolicy::default().apply(&mut doc, &mut link, "Annot", &mut detached, &mut log);
        detached.reattach(action_id, &mut action, &mut log);
        drop(log);

        assert_eq!(lines, vec!["(Annot) A: 7 0 R", "(Annot > A) F: (evil.exe)"]);
        assert!(!link.has(b"A"));
        assert!(!action.as_dict().unwrap().has(b"F"));
    }

    #[test]
    fn detached_non_launch_action_is_kept() {
        let mut doc = Document::with_version("1.7");
        let action_id = (7, 0);
        let mut detached = DetachedObjects::default();
        detached.detach(action_id, &Object::Dictionary(dictionary! { "S" => "GoTo" }));

        let mut link = dictionary! { "A" => action_id };
        let mut log = RemovalLog::new(None);
        SanitizationPolicy::default().apply(&mut doc, &mut link, "Annot", &mut detached, &mut log);

        assert_eq!(log.len(), 0);
        assert!(link.has(b"A"));
    }
}
