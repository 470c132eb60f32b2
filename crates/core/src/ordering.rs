use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::domain::{AlbumId, OrderAssignment};
use crate::error::{Error, Result};
use crate::registry::OrderLock;

/// Commits new album orders in bulk.
pub struct OrderingService<C> {
    catalog: Arc<C>,
    order_lock: Arc<OrderLock>,
}

impl<C: Catalog> OrderingService<C> {
    pub fn new(catalog: Arc<C>, order_lock: Arc<OrderLock>) -> Self {
        Self {
            catalog,
            order_lock,
        }
    }

    /// Apply every assignment atomically, or none.
    ///
    /// Rejects lists that name an album twice or give two albums the same
    /// order; a collision with an album the list leaves alone is rejected by
    /// the catalog and rolls the whole commit back. Album creation waits for
    /// the commit to finish.
    pub fn commit_order(&self, assignments: &[OrderAssignment]) -> Result<()> {
        validate(assignments)?;
        if assignments.is_empty() {
            return Ok(());
        }

        let _orders = self.order_lock.acquire()?;
        self.catalog.update_album_orders(assignments)?;
        debug!(albums = assignments.len(), "committed album order");
        Ok(())
    }

    /// Commit a full display sequence: the first album gets order 0, the next 1, and so on.
    pub fn reorder(&self, sequence: &[AlbumId]) -> Result<()> {
        let assignments: Vec<OrderAssignment> = sequence
            .iter()
            .zip(0_i64..)
            .map(|(id, order)| OrderAssignment::new(*id, order))
            .collect();
        self.commit_order(&assignments)
    }
}

fn validate(assignments: &[OrderAssignment]) -> Result<()> {
    let mut albums = HashSet::with_capacity(assignments.len());
    let mut orders = HashSet::with_capacity(assignments.len());
    for assignment in assignments {
        if !albums.insert(assignment.album_id) {
            return Err(Error::DuplicateAssignment(assignment.album_id));
        }
        if !orders.insert(assignment.order) {
            return Err(Error::DuplicateOrder(assignment.order));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, SqliteCatalog};
    use crate::domain::Album;
    use crate::registry::AlbumRegistry;

    struct Fixture<C> {
        catalog: Arc<C>,
        registry: AlbumRegistry<C>,
        ordering: OrderingService<C>,
    }

    fn fixture<C: Catalog>(catalog: C) -> Fixture<C> {
        let catalog = Arc::new(catalog);
        let lock = Arc::new(OrderLock::default());
        Fixture {
            registry: AlbumRegistry::new(catalog.clone(), lock.clone()),
            ordering: OrderingService::new(catalog.clone(), lock),
            catalog,
        }
    }

    fn ids(albums: &[Album]) -> Vec<AlbumId> {
        albums.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_swap_two_albums() {
        let f = fixture(SqliteCatalog::open_in_memory().unwrap());
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();
        assert_eq!((a.order, b.order), (0, 1));

        f.ordering
            .commit_order(&[OrderAssignment::new(b.id, 0), OrderAssignment::new(a.id, 1)])
            .unwrap();

        assert_eq!(ids(&f.catalog.list_albums().unwrap()), vec![b.id, a.id]);
    }

    #[test]
    fn test_rotation_of_three() {
        let f = fixture(SqliteCatalog::open_in_memory().unwrap());
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();
        let c = f.registry.resolve_or_create("C").unwrap();

        f.ordering.reorder(&[c.id, a.id, b.id]).unwrap();

        let albums = f.catalog.list_albums().unwrap();
        assert_eq!(ids(&albums), vec![c.id, a.id, b.id]);
        let orders: Vec<i64> = albums.iter().map(|x| x.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    fn commit_sparse<C: Catalog>(catalog: C) -> Vec<(String, i64)> {
        let f = fixture(catalog);
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();
        f.ordering
            .commit_order(&[OrderAssignment::new(a.id, -2), OrderAssignment::new(b.id, 5)])
            .unwrap();
        let c = f.registry.resolve_or_create("C").unwrap();
        assert_eq!(c.order, 6);

        f.catalog
            .list_albums()
            .unwrap()
            .into_iter()
            .map(|x| (x.name, x.order))
            .collect()
    }

    #[test]
    fn test_sparse_negative_orders_on_both_backends() {
        let expected = vec![("A".to_string(), -2), ("B".to_string(), 5), ("C".to_string(), 6)];
        assert_eq!(commit_sparse(SqliteCatalog::open_in_memory().unwrap()), expected);
        assert_eq!(commit_sparse(MemoryCatalog::new()), expected);
    }

    #[test]
    fn test_duplicate_orders_in_request_rejected() {
        let f = fixture(MemoryCatalog::new());
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();

        let err = f
            .ordering
            .commit_order(&[OrderAssignment::new(a.id, 3), OrderAssignment::new(b.id, 3)])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateOrder(3)));
        assert_eq!(f.catalog.list_albums().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_album_named_twice_rejected() {
        let f = fixture(MemoryCatalog::new());
        let a = f.registry.resolve_or_create("A").unwrap();

        let err = f
            .ordering
            .commit_order(&[OrderAssignment::new(a.id, 3), OrderAssignment::new(a.id, 4)])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateAssignment(id) if id == a.id));
    }

    #[test]
    fn test_partial_failure_applies_nothing() {
        let f = fixture(SqliteCatalog::open_in_memory().unwrap());
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();

        let err = f
            .ordering
            .commit_order(&[
                OrderAssignment::new(b.id, 0),
                OrderAssignment::new(a.id, 1),
                OrderAssignment::new(AlbumId(404), 2),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::AlbumNotFound(AlbumId(404))));
        assert_eq!(f.catalog.list_albums().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let f = fixture(MemoryCatalog::new());
        let a = f.registry.resolve_or_create("A").unwrap();
        f.ordering.commit_order(&[]).unwrap();
        assert_eq!(f.catalog.list_albums().unwrap(), vec![a]);
    }

    #[test]
    fn test_new_album_after_reorder_goes_last() {
        let f = fixture(MemoryCatalog::new());
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();
        f.ordering.reorder(&[b.id, a.id]).unwrap();

        let c = f.registry.resolve_or_create("C").unwrap();
        assert_eq!(c.order, 2);
        assert_eq!(ids(&f.catalog.list_albums().unwrap()), vec![b.id, a.id, c.id]);
    }

    #[test]
    fn test_readers_never_see_partial_reorder() {
        let f = fixture(SqliteCatalog::open_in_memory().unwrap());
        let albums: Vec<Album> = (0..6)
            .map(|i| f.registry.resolve_or_create(&format!("album {i}")).unwrap())
            .collect();
        let forward: Vec<AlbumId> = ids(&albums);
        let backward: Vec<AlbumId> = forward.iter().rev().copied().collect();

        std::thread::scope(|s| {
            s.spawn(|| {
                for round in 0..50 {
                    let sequence = if round % 2 == 0 { &backward } else { &forward };
                    f.ordering.reorder(sequence).unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..200 {
                    let seen = ids(&f.catalog.list_albums().unwrap());
                    assert!(seen == forward || seen == backward, "partial order observed: {seen:?}");
                }
            });
        });
    }

    #[test]
    fn test_concurrent_creates_and_reorders_keep_orders_unique() {
        let f = fixture(MemoryCatalog::new());
        let a = f.registry.resolve_or_create("A").unwrap();
        let b = f.registry.resolve_or_create("B").unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for round in 0..20 {
                    let sequence = if round % 2 == 0 { [b.id, a.id] } else { [a.id, b.id] };
                    f.ordering.reorder(&sequence).unwrap();
                }
            });
            s.spawn(|| {
                for i in 0..20 {
                    f.registry.resolve_or_create(&format!("new {i}")).unwrap();
                }
            });
        });

        let albums = f.catalog.list_albums().unwrap();
        assert_eq!(albums.len(), 22);
        let orders: HashSet<i64> = albums.iter().map(|x| x.order).collect();
        assert_eq!(orders.len(), 22);
    }
}
