pub mod account;
pub mod error;
pub mod post;
pub mod relationship;
pub mod validate;
