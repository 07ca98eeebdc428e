//! Lazy, forward-only streams of policy readers (`spec.md` §4.1).
//!
//! Two capabilities are defined here:
//!
//! - [`ReadCloserIterator`]: finite, forward-only, non-restartable stream of
//!   readers.
//! - [`NamedReadCloserIterator`]: the same, but each reader carries a
//!   deterministic, unique ID (e.g. a path relative to a declared root).
//!   Duplicate IDs are a load-time error, enforced by the loaders in
//!   `org-policy`/`project-policy`, not by the iterator itself.
//!
//! Contract: `next` must only be called when `has_next` returns `true`.
//! Once `error` becomes non-empty the iteration is considered terminated —
//! well-behaved implementations make `has_next` return `false` from then on.

pub mod fs;
pub mod slice;

use crate::error::PolicyError;
use std::io::Read;

/// A reader that can be explicitly released. Every `Read` implementer gets
/// this for free via the blanket impl below — `close` is a no-op unless a
/// concrete reader overrides it, since most Rust readers (`File`, `Cursor`)
/// already release their resource on `Drop`. The explicit method exists so
/// loaders can honor the "release readers on all exit paths" contract
/// (`spec.md` §5) without relying on drop order.
pub trait ReadClose: Read {
    fn close(&mut self) -> Result<(), PolicyError> {
        Ok(())
    }
}

impl<T: Read> ReadClose for T {}

/// A finite, forward-only stream of policy-document readers.
pub trait ReadCloserIterator {
    fn has_next(&self) -> bool;
    /// Only valid to call when [`Self::has_next`] is `true`.
    fn next(&mut self) -> Box<dyn ReadClose>;
    fn error(&self) -> Option<&PolicyError>;
}

/// Like [`ReadCloserIterator`], but each reader carries a stable, unique ID.
pub trait NamedReadCloserIterator {
    fn has_next(&self) -> bool;
    /// Only valid to call when [`Self::has_next`] is `true`.
    fn next(&mut self) -> (String, Box<dyn ReadClose>);
    fn error(&self) -> Option<&PolicyError>;
}

/// Drains a [`NamedReadCloserIterator`] into `(id, bytes)` pairs, reading
/// and closing every reader, and surfaces the iterator's own `error()` (if
/// any) after exhaustion. This is the one place every loader funnels
/// through, so the "release on all exit paths" contract only needs to be
/// satisfied once.
pub fn drain_named(
    mut iter: impl NamedReadCloserIterator,
    layer: &'static str,
) -> Result<Vec<(String, Vec<u8>)>, PolicyError> {
    let mut out = Vec::new();
    while iter.has_next() {
        let (id, mut reader) = iter.next();
        let mut buf = Vec::new();
        let read_result = reader.read_to_end(&mut buf);
        let close_result = reader.close();
        read_result.map_err(|e| {
            PolicyError::invalid_input(layer, format!("failed to read policy '{id}': {e}"))
        })?;
        close_result?;
        out.push((id, buf));
    }
    if let Some(err) = iter.error() {
        return Err(PolicyError::invalid_input(
            layer,
            format!("policy source iterator failed: {err}"),
        ));
    }
    Ok(out)
}
