pub mod action;
pub mod game;
pub mod health;
pub mod response;
pub mod sse;
pub mod validation;
