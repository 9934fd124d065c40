use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// Handle into the process-wide identifier table.
///
/// Comparisons are integer comparisons; the string behind a handle is only
/// looked up for display and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(u32);

#[derive(Default)]
struct Interner {
    ids: HashMap<Arc<str>, u32>,
    names: Vec<Arc<str>>,
}

fn table() -> &'static RwLock<Interner> {
    static TABLE: OnceLock<RwLock<Interner>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(Interner::default()))
}

impl Identifier {
    /// Returns the handle for `name`, registering it on first use.
    pub fn intern(name: &str) -> Self {
        if let Some(id) = Self::lookup(name) {
            return id;
        }

        let mut interner = table().write().unwrap_or_else(|poisoned| poisoned.into_inner());
        // another thread may have inserted it between the two locks
        if let Some(&id) = interner.ids.get(name) {
            return Identifier(id);
        }
        let id = interner.names.len() as u32;
        let shared: Arc<str> = Arc::from(name);
        interner.names.push(Arc::clone(&shared));
        interner.ids.insert(shared, id);
        Identifier(id)
    }

    /// Returns the handle for `name` without registering it.
    pub fn lookup(name: &str) -> Option<Self> {
        let interner = table().read().unwrap_or_else(|poisoned| poisoned.into_inner());
        interner.ids.get(name).map(|&id| Identifier(id))
    }

    pub fn name(&self) -> Arc<str> {
        let interner = table().read().unwrap_or_else(|poisoned| poisoned.into_inner());
        interner
            .names
            .get(self.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::intern(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let a = Identifier::intern("identifier-test-TP53");
        let b = Identifier::intern("identifier-test-TP53");
        let c = Identifier::intern("identifier-test-BRCA1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*a.name(), "identifier-test-TP53");
        assert_eq!(c.to_string(), "identifier-test-BRCA1");
    }

    #[test]
    fn test_lookup_does_not_register() {
        assert!(Identifier::lookup("identifier-test-never-seen").is_none());
        let id = Identifier::intern("identifier-test-seen");
        assert_eq!(Identifier::lookup("identifier-test-seen"), Some(id));
    }

    #[test]
    fn test_concurrent_interning_agrees() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..50)
                        .map(|i| Identifier::intern(&format!("identifier-test-conc-{i}")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<Identifier>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for other in &results[1..] {
            assert_eq!(&results[0], other);
        }
    }
}
