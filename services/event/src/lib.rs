pub mod cards;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod handlers;
pub mod infra;
pub mod mailer;
pub mod mint;
pub mod otp;
pub mod pending;
pub mod router;
pub mod state;
pub mod usecase;
