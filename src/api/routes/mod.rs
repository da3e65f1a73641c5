pub mod home;
pub mod messages;
pub mod scores;
