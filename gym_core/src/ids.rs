//! Unique id supply for new records.

use uuid::Uuid;

/// Source of opaque, collision-resistant record ids
pub trait IdSupplier: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs, the default supplier
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidSupplier;

impl IdSupplier for UuidSupplier {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let supplier = UuidSupplier;
        let ids: HashSet<_> = (0..100).map(|_| supplier.next_id()).collect();
        assert_eq!(ids.len(), 100);
    }
}
