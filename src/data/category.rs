use crate::data::Identifier;

/// An immutable named set of identifiers.
///
/// Members are stored sorted and deduplicated, membership is a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    reference: Option<String>,
    members: Vec<Identifier>,
}

impl Category {
    pub fn new<I>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = Identifier>,
    {
        let mut members: Vec<Identifier> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Category {
            name: name.into(),
            reference: None,
            members,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        self.reference = if reference.is_empty() {
            None
        } else {
            Some(reference)
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn members(&self) -> &[Identifier] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.members.binary_search(&id).is_ok()
    }
}

/// A named collection of categories, e.g. one pathway database.
#[derive(Debug, Clone)]
pub struct CategoryDatabase {
    pub name: String,
    pub categories: Vec<Category>,
}

impl CategoryDatabase {
    pub fn new(name: impl Into<String>, categories: Vec<Category>) -> Self {
        CategoryDatabase {
            name: name.into(),
            categories,
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<Identifier> {
        names.iter().map(|n| Identifier::intern(n)).collect()
    }

    #[test]
    fn test_members_are_deduplicated() {
        let cat = Category::new("c", ids(&["cat-a", "cat-b", "cat-a"]));
        assert_eq!(cat.len(), 2);
        assert!(cat.contains(Identifier::intern("cat-a")));
        assert!(!cat.contains(Identifier::intern("cat-z")));
    }

    #[test]
    fn test_empty_reference_is_none() {
        let cat = Category::new("c", ids(&["cat-a"])).with_reference("");
        assert!(cat.reference().is_none());
        let cat = cat.with_reference("http://example.org/c");
        assert_eq!(cat.reference(), Some("http://example.org/c"));
    }
}
