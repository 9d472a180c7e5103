//! Pure game logic for Questline.
//!
//! Everything in this crate is deterministic given its inputs plus, for the
//! draw engine, a caller-supplied random source. No persistence, no I/O.
//!
//! - [`draw`] -- the weighted draw engine shared by event, reward, and
//!   monster pools, plus weight-normalization math
//! - [`resolve`] -- event-result selection (condition filter, priority,
//!   stable tie-break)
//! - [`error`] -- draw failure taxonomy

pub mod draw;
pub mod error;
pub mod resolve;

pub use draw::{Weighted, choose, choose_index, normalized};
pub use error::DrawError;
pub use resolve::{ConditionEvaluator, select_result};
