//! Linkage Module - Record Linkage Engine
//!
//! Joins raw flow records with the independently named ground truth table on
//! a composite key. Both sides are canonicalized before comparison so that a
//! port stored as `80` in one file and `80.0` in the other still match.

pub mod join;
pub mod key;


pub use join::inner_join;
pub use key::{canonicalize, CompositeKey, KeyPair};
