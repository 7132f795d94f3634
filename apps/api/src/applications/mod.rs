// Application submission, review status and listing.
// Answers are validated against the opportunity's question snapshot at submit time.

pub mod handlers;
pub mod models;
pub mod store;
pub mod submission;
pub mod validation;
