//! Instance similarity engine
//!
//! Expresses every instance as a patch against the cheapest earlier instance of the same
//! type and orders the instances that survive collapsing so children come first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use datatrait::similarity::{BaseMatcher, Comparator};
//!
//! let mut matcher = BaseMatcher::new(inferrer.registry(), inferrer.instances());
//! if let Some(link) = matcher.best_base_for(id)? {
//!     println!("{} patches {} with {} entries", id, link.base, link.diff.len());
//! }
//! ```

mod diff;
mod matcher;
mod ordering;

pub use diff::{Comparator, Comparison, DiffEntry};
pub use matcher::{BaseLink, BaseMatcher};
pub use ordering::order_instances;
