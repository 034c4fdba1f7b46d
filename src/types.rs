// src/types.rs

use indexmap::IndexMap;
use std::fmt;

/// Maps declared C type names to the ctypes token used as `restype`.
///
/// A `None` target means the type is known but no return marshalling type
/// is set. Keys use the canonical spelling produced by the parser
/// (`unsigned char`, `float32*`, `Imterface<float32>`).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMap {
    entries: IndexMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLookup<'a> {
    Scalar(&'a str),
    Untyped, // known, but no restype line
}

impl TypeMap {
    pub fn empty() -> Self {
        TypeMap {
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, declared: &str, target: Option<&str>) {
        self.entries.insert(
            normalize_type_name(declared),
            target.map(|t| t.to_string()),
        );
    }

    /// Looks up a declared type. `None` means the type is not mapped at all.
    pub fn lookup(&self, declared: &str) -> Option<TypeLookup<'_>> {
        let entry = match self.entries.get(declared) {
            Some(entry) => entry,
            None => self.entries.get(&normalize_type_name(declared))?,
        };
        Some(match entry {
            Some(target) => TypeLookup::Scalar(target.as_str()),
            None => TypeLookup::Untyped,
        })
    }

    pub fn contains(&self, declared: &str) -> bool {
        self.lookup(declared).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Later entries override earlier ones
    pub fn merge(&mut self, other: &TypeMap) {
        for (declared, target) in &other.entries {
            self.entries.insert(declared.clone(), target.clone());
        }
    }
}

impl Default for TypeMap {
    fn default() -> Self {
        let mut map = TypeMap::empty();
        map.insert("uint8", Some("ctypes.c_uint8"));
        map.insert("int", Some("ctypes.c_int"));
        map.insert("float32", Some("ctypes.c_float"));
        map.insert("void", None);
        map.insert("double", Some("ctypes.c_double"));
        map.insert("float", Some("ctypes.c_float"));
        map
    }
}

impl fmt::Display for TypeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (declared, target)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match target {
                Some(t) => write!(f, "{} -> {}", declared, t)?,
                None => write!(f, "{} -> (none)", declared)?,
            }
        }
        Ok(())
    }
}

// Collapses whitespace the same way the parser renders declared types
pub fn normalize_type_name(name: &str) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    let mut prev_word = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        let is_word = ch.is_ascii_alphanumeric() || ch == '_';
        if pending_space && prev_word && is_word {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
        prev_word = is_word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_generator() {
        let map = TypeMap::default();
        assert_eq!(map.lookup("float"), Some(TypeLookup::Scalar("ctypes.c_float")));
        assert_eq!(map.lookup("uint8"), Some(TypeLookup::Scalar("ctypes.c_uint8")));
        assert_eq!(map.lookup("void"), Some(TypeLookup::Untyped));
        assert_eq!(map.lookup("float64"), None);
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn lookup_ignores_spacing() {
        let mut map = TypeMap::empty();
        map.insert("unsigned   char", Some("ctypes.c_ubyte"));
        map.insert("Imterface< float32 >", Some("get_c_image_type(np.float32)"));
        assert!(map.contains("unsigned char"));
        assert_eq!(
            map.lookup("Imterface<float32>"),
            Some(TypeLookup::Scalar("get_c_image_type(np.float32)"))
        );
    }

    #[test]
    fn merge_overrides() {
        let mut base = TypeMap::default();
        let mut extra = TypeMap::empty();
        extra.insert("int", Some("ctypes.c_int32"));
        extra.insert("size_t", Some("ctypes.c_size_t"));
        base.merge(&extra);
        assert_eq!(base.lookup("int"), Some(TypeLookup::Scalar("ctypes.c_int32")));
        assert!(base.contains("size_t"));
    }

    #[test]
    fn normalize_examples() {
        assert_eq!(normalize_type_name("  const  float32 * "), "const float32*");
        assert_eq!(normalize_type_name("std :: size_t"), "std::size_t");
    }
}
