use std::fmt;

use smol_str::SmolStr;

/// Root namespace every custom definition lives under.
pub const ROOT_PREFIX: &str = "custom";

/// Fully qualified callable name: namespace segments plus a leaf name.
/// User-supplied names are split on `.` and prefixed with the fixed
/// root, so `foo.bar` becomes `custom.foo.bar`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct QualifiedName {
    pub namespace: Vec<SmolStr>,
    pub name: SmolStr,
}

impl QualifiedName {
    pub fn new(namespace: Vec<SmolStr>, name: impl AsRef<str>) -> Self {
        Self {
            namespace,
            name: SmolStr::new(name.as_ref()),
        }
    }

    /// Parse a user-supplied dotted name, prefixing the fixed root.
    pub fn from_user(name: &str) -> Self {
        let mut segments: Vec<SmolStr> = vec![SmolStr::new(ROOT_PREFIX)];
        let mut parts = name.split('.').map(str::trim).peekable();
        let mut leaf = SmolStr::default();
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                segments.push(SmolStr::new(part));
            } else {
                leaf = SmolStr::new(part);
            }
        }
        Self {
            namespace: segments,
            name: leaf,
        }
    }

    /// Parse an already-qualified dotted name (root prefix included).
    pub fn from_qualified(name: &str) -> Self {
        let mut segments: Vec<SmolStr> = name.split('.').map(SmolStr::new).collect();
        let leaf = segments.pop().unwrap_or_default();
        Self {
            namespace: segments,
            name: leaf,
        }
    }

    /// Dotted rendering without the root prefix, as users typed it.
    pub fn user_name(&self) -> String {
        let mut parts: Vec<&str> = self
            .namespace
            .iter()
            .map(SmolStr::as_str)
            .skip_while(|s| *s == ROOT_PREFIX)
            .collect();
        parts.push(self.name.as_str());
        parts.join(".")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.namespace {
            write!(f, "{segment}.")?;
        }
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_name_gets_root_prefix() {
        let name = QualifiedName::from_user("answer");
        assert_eq!(name.to_string(), "custom.answer");
        assert_eq!(name.user_name(), "answer");

        let name = QualifiedName::from_user("foo.bar.baz");
        assert_eq!(name.to_string(), "custom.foo.bar.baz");
        assert_eq!(name.user_name(), "foo.bar.baz");
    }

    #[test]
    fn qualified_round_trip() {
        let name = QualifiedName::from_qualified("custom.foo.answer");
        assert_eq!(name.namespace.len(), 2);
        assert_eq!(name.name, "answer");
        assert_eq!(name.to_string(), "custom.foo.answer");
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            QualifiedName::from_user("foo.bar"),
            QualifiedName::from_qualified("custom.foo.bar")
        );
    }
}
