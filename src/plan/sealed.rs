// ABOUTME: Sealed trait pattern for builder phase traits.
// ABOUTME: Prevents external phase types from unlocking builder directives.

/// Sealed trait to prevent external implementations.
///
/// Only the phase markers in this crate can implement the phase traits, so
/// callers cannot invent a phase that skips ordering rules.
pub trait Sealed {}
