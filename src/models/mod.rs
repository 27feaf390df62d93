pub mod auth;
pub mod feed;
pub mod gfy;
pub mod upload;
pub mod user;
