use std::collections::HashMap;

const TAG_PREFIX: &str = "refs/tags/";
const HEAD_PREFIX: &str = "refs/heads/";
const DEREF_SUFFIX: &str = "^{}";

/// What a reference points from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Tag,
    Branch,
    /// Anything else under refs/ (remotes, notes, stash), kept by full path
    Other,
}

/// A named pointer at a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub name: String,
    pub id: String,
    pub kind: RefKind,
    /// Another ref for the same commit follows this one
    pub next: bool,
}

impl Ref {
    pub fn is_tag(&self) -> bool {
        self.kind == RefKind::Tag
    }
}

/// Commit id → refs pointing at it, in listing order.
///
/// Built once from `git ls-remote`-style output and read-only afterwards.
#[derive(Debug, Default)]
pub struct RefStore {
    groups: Vec<Vec<Ref>>,
    index: HashMap<String, usize>,
}

impl RefStore {
    /// Build the store from `<id><separator><ref-path>` lines. Any run of
    /// tabs or spaces separates the two fields.
    pub fn parse(listing: &str) -> Self {
        let mut store = RefStore::default();
        for line in listing.lines() {
            let line = line.trim_end_matches('\r');
            let Some((id, name)) = line.split_once(|c: char| c == '\t' || c == ' ') else {
                continue;
            };
            let name = name.trim_start_matches(|c: char| c == '\t' || c == ' ');
            if id.is_empty() || name.is_empty() {
                continue;
            }
            store.read_ref(id, name);
        }
        store
    }

    /// Apply the listing rules to a single entry.
    fn read_ref(&mut self, id: &str, name: &str) {
        // Commits referenced by annotated tags have "^{}" appended.
        let (name, tag_commit) = match name.strip_suffix(DEREF_SUFFIX) {
            Some(stripped) if !stripped.is_empty() => (stripped, true),
            _ => (name, false),
        };

        let (name, kind) = if let Some(tag) = name.strip_prefix(TAG_PREFIX) {
            // The tag object itself is useless to us; only its dereferenced
            // commit is shown.
            if !tag_commit {
                return;
            }
            (tag, RefKind::Tag)
        } else if let Some(head) = name.strip_prefix(HEAD_PREFIX) {
            (head, RefKind::Branch)
        } else if name == "HEAD" {
            return;
        } else {
            (name, RefKind::Other)
        };

        self.push(Ref {
            name: name.to_string(),
            id: id.to_string(),
            kind,
            next: false,
        });
    }

    fn push(&mut self, entry: Ref) {
        match self.index.get(&entry.id) {
            Some(&slot) => {
                let group = &mut self.groups[slot];
                if let Some(last) = group.last_mut() {
                    last.next = true;
                }
                group.push(entry);
            }
            None => {
                self.index.insert(entry.id.clone(), self.groups.len());
                self.groups.push(vec![entry]);
            }
        }
    }

    /// Refs for a commit id, empty if none point at it.
    pub fn get(&self, id: &str) -> &[Ref] {
        self.index
            .get(id)
            .map(|&slot| self.groups[slot].as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct commits with at least one ref.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Commit ids in first-seen order.
    #[allow(dead_code)]
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(|g| g.first()).map(|r| r.id.as_str())
    }
}
