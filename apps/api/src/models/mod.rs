pub mod agent;
pub mod application;
pub mod notification;
pub mod opportunity;
pub mod question;
