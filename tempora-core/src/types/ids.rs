/// Identifier newtypes for the four sequence-backed id spaces and documents
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the inner value
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type!(
    /// Identifier of a loaded document
    DocumentId
);
id_type!(
    /// Identifier of a namespace dictionary row
    NamespaceId
);
id_type!(
    /// Identifier of a node shape (schema position)
    NodeClassId
);
id_type!(
    /// Identifier of a depth-wide ordering sequence
    OrderClassId
);
id_type!(
    /// Identifier shared by every temporal record of one node
    NodeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversions() {
        let id = NodeId::from(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_ids_order_by_value() {
        let mut ids = vec![NodeId(3), NodeId(1), NodeId(2)];
        ids.sort();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }
}
