//! Constant folder for the BASIC front end.
//!
//! Rewrites literal expression subtrees in place, preserving BASIC runtime
//! semantics exactly: no trap that would have fired at runtime may be
//! elided (division by a literal zero stays a division), and no trap that
//! would not have fired may be introduced (the i16 add guard refuses folds
//! whose overflow the runtime would report).
//!
//! Folding is idempotent and location-preserving: a replacement literal
//! carries the span of the node it replaced.

mod arith;
mod builtins;
mod logic;
mod numeric;
mod pass;
mod strings;
#[cfg(test)]
mod tests;

pub use pass::fold_constants;
