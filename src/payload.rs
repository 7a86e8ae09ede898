//! Payload capability required by the tree.

use std::sync::Arc;

/// Placeholder rendered for records without a meaningful payload.
pub const PLACEHOLDER: &str = "-";

/// Payload is the value bound to a block, e.g. the country of a set of IPs.
///
/// The tree only ever compares payloads for equality and renders them for
/// dumps; it never looks inside. Wrap large values in [`Arc`] to share one
/// allocation across every block that carries it.
pub trait Payload: PartialEq {
    /// Textual form used in dumps.
    fn render(&self) -> String;
}

impl Payload for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl Payload for &str {
    fn render(&self) -> String {
        (*self).to_string()
    }
}

impl Payload for Box<str> {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl Payload for () {
    fn render(&self) -> String {
        PLACEHOLDER.to_string()
    }
}

impl<T: Payload + ?Sized> Payload for Arc<T> {
    fn render(&self) -> String {
        (**self).render()
    }
}

impl<T: Payload> Payload for Option<T> {
    fn render(&self) -> String {
        match self {
            Some(v) => v.render(),
            None => PLACEHOLDER.to_string(),
        }
    }
}
