//! Route modules for the mandate API surface.

pub mod mandates;
pub mod webhooks;
