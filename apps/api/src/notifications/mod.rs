// Notification feed (in-app inbox) and outbound confirmation emails.

pub mod dispatcher;
pub mod feed;
pub mod handlers;
