//! Thread-safe wrapper around [`Tree`].

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::net::IpAddr;

use crate::cidr::Cidr;
use crate::payload::Payload;
use crate::record::Record;
use crate::tree::Tree;

/// A [`Tree`] behind a single-writer/multiple-reader lock.
///
/// Insertions take the write lock; lookups and dumps share the read lock.
///
/// # Examples
/// ```
/// use geotrie::SharedTree;
/// use std::sync::Arc;
///
/// let tree = Arc::new(SharedTree::new());
/// tree.add("10.0.0.0/8".parse().unwrap(), String::from("private"), false);
///
/// let reader = Arc::clone(&tree);
/// std::thread::spawn(move || {
///     assert_eq!(reader.lookup(0x0A01_0203).as_deref(), Some("private"));
/// })
/// .join()
/// .unwrap();
/// ```
#[derive(Debug)]
pub struct SharedTree<P> {
    inner: RwLock<Tree<P>>,
}

impl<P> SharedTree<P> {
    /// Create an empty shared tree.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tree::new()),
        }
    }

    /// Take the read lock for several queries in a row.
    pub fn read(&self) -> RwLockReadGuard<'_, Tree<P>> {
        self.inner.read()
    }

    /// Take the write lock for a batch of insertions.
    pub fn write(&self) -> RwLockWriteGuard<'_, Tree<P>> {
        self.inner.write()
    }

    pub fn into_inner(self) -> Tree<P> {
        self.inner.into_inner()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<P: Payload + Clone> SharedTree<P> {
    /// Insert a block. See [`Tree::add`].
    pub fn add(&self, cidr: Cidr, payload: P, overwrite: bool) {
        self.inner.write().add(cidr, payload, overwrite);
    }

    /// Insert records under a single write lock.
    pub fn add_records<I>(&self, records: I, overwrite: bool)
    where
        I: IntoIterator<Item = Record<P>>,
    {
        let mut tree = self.inner.write();
        for record in records {
            tree.add_record(record, overwrite);
        }
    }

    /// Longest-prefix match, returning a clone of the payload.
    pub fn lookup(&self, addr: u32) -> Option<P> {
        self.inner.read().lookup(addr).cloned()
    }

    pub fn lookup_ip(&self, ip: IpAddr) -> Option<P> {
        self.inner.read().lookup_ip(ip).cloned()
    }

    /// Dump every block in address order.
    pub fn dump(&self) -> Vec<String> {
        self.inner.read().dump()
    }
}

impl<P> Default for SharedTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> From<Tree<P>> for SharedTree<P> {
    fn from(tree: Tree<P>) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }
}
