//! Scoped storage for secret key material.
//!
//! A [`SecretBuffer`] is zero-initialised, page-locked for its whole lifetime
//! when the operating system allows it, and wiped before it is released on
//! every exit path.
//!
//! Page locks are not counted, so unlocking one range unlocks every page it
//! touches. Each buffer therefore sits on whole pages that no other
//! allocation shares.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Once;
use tracing::warn;
use zeroize::Zeroize;

static LOCK_WARNING: Once = Once::new();

pub struct SecretBuffer {
    // Declared before `storage`: the pages are unlocked after `Drop::drop`
    // has wiped them and before the allocation is freed.
    _lock: Option<region::LockGuard>,
    storage: Box<[u8]>,
    offset: usize,
    len: usize,
}

impl SecretBuffer {
    /// Allocates `len` zeroed bytes, locked in memory where possible.
    pub fn new(len: usize) -> Self {
        if len == 0 {
            return Self {
                _lock: None,
                storage: Box::default(),
                offset: 0,
                len: 0,
            };
        }

        let page = region::page::size();
        let span = len.div_ceil(page) * page;
        // One spare page leaves room to start on a page boundary.
        let storage = vec![0u8; span + page].into_boxed_slice();
        let offset = match storage.as_ptr().align_offset(page) {
            offset if offset < page => offset,
            _ => 0,
        };
        let lock = match region::lock(storage[offset..].as_ptr(), span) {
            Ok(guard) => Some(guard),
            Err(e) => {
                LOCK_WARNING.call_once(|| {
                    warn!("Warning: using insecure memory! ({})", e);
                });
                None
            }
        };
        Self {
            _lock: lock,
            storage,
            offset,
            len,
        }
    }

    /// Copies `data` into a fresh buffer.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut buffer = Self::new(data.len());
        buffer.copy_from_slice(data);
        buffer
    }

    /// Whether the pages backing this buffer are locked against swapping.
    pub fn is_locked(&self) -> bool {
        self._lock.is_some()
    }
}

impl Deref for SecretBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }
}

impl DerefMut for SecretBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }
}

impl AsRef<[u8]> for SecretBuffer {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl AsMut<[u8]> for SecretBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.storage.zeroize();
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("len", &self.len)
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}
