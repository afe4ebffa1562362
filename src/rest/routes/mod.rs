pub mod health;
pub mod identity;
pub mod login;
pub mod roster;
pub mod setup;
