//! Object identifiers: ordered sequences of sub-identifiers.

use std::fmt;

/// An SNMP object identifier.
///
/// Ordering is derived and therefore element-wise lexicographic: the empty
/// OID precedes every other OID, and a prefix precedes any of its
/// extensions. This is exactly the order `read_next` walks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid(pub Vec<u32>);

impl Oid {
    pub fn new(ids: Vec<u32>) -> Self {
        Oid(ids)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for Oid {
    fn from(ids: Vec<u32>) -> Self {
        Oid(ids)
    }
}

impl From<&[u32]> for Oid {
    fn from(ids: &[u32]) -> Self {
        Oid(ids.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(ids: [u32; N]) -> Self {
        Oid(ids.to_vec())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_oid_precedes_all() {
        let empty = Oid::new(vec![]);
        let non_empty = Oid::new(vec![1]);
        assert!(empty < non_empty);
    }

    #[test]
    fn prefix_precedes_extension() {
        let prefix = Oid::new(vec![1, 3, 6]);
        let extension = Oid::new(vec![1, 3, 6, 1]);
        assert!(prefix < extension);
    }

    #[test]
    fn lexicographic_order_on_first_difference() {
        let a = Oid::new(vec![1, 3, 6, 1, 4, 1, 121, 1, 1]);
        let b = Oid::new(vec![1, 3, 6, 1, 4, 1, 121, 1, 2]);
        assert!(a < b);
    }

    #[test]
    fn display_is_dotted() {
        let oid = Oid::new(vec![1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    }
}
