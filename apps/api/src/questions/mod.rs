// Per-opportunity application questions.
// Orders are always the gapless sequence 1..=N; all order math is in `ordering`.

pub mod handlers;
pub mod models;
pub mod ordering;
pub mod store;
pub mod sync;
pub mod validation;
