//! Ordered, case-insensitive header map.

/// Part headers.
///
/// Lookups fold ASCII case. Iteration yields entries in insertion order with
/// the case they were inserted with. Inserting a name that is already present
/// (under case folding) replaces that entry in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a header, returning the previous value for that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.position(&name) {
            let (old_name, old_value) = &mut self.entries[slot];
            *old_name = name;
            return Some(std::mem::replace(old_value, value));
        }
        self.entries.push((name, value));
        None
    }

    /// Look up a header value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|slot| self.entries[slot].1.as_str())
    }

    /// Whether a header is present.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|slot| self.entries.remove(slot).1)
    }

    /// Iterate `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_folds_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains_key("Content-type"));
        assert_eq!(headers.get("content-length"), None);
    }

    #[test]
    fn iteration_preserves_case_and_order() {
        let headers: Headers = [
            ("Content-Disposition", "form-data; name=\"a\""),
            ("X-Trace", "1"),
            ("content-type", "text/plain"),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Content-Disposition", "X-Trace", "content-type"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut headers = Headers::new();
        headers.insert("Content-Disposition", "form-data");
        headers.insert("Content-Type", "text/plain");
        headers.insert("X-Extra", "1");

        let old = headers.insert("content-type", "application/json");
        assert_eq!(old.as_deref(), Some("text/plain"));
        assert_eq!(headers.len(), 3);

        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries[1], ("content-type", "application/json"));
    }

    #[test]
    fn remove_by_any_case() {
        let mut headers: Headers = [("X-One", "1"), ("X-Two", "2")].into_iter().collect();
        assert_eq!(headers.remove("x-one").as_deref(), Some("1"));
        assert_eq!(headers.remove("x-one"), None);
        assert_eq!(headers.len(), 1);
        assert!(!headers.is_empty());
    }
}
