// Library half of quizdesk: everything except terminal setup and the event
// loop, so integration tests can drive auth, API and session logic directly.

pub mod api;
pub mod app;
pub mod auth;
pub mod authoring;
pub mod config;
pub mod error;
pub mod event;
pub mod session;
pub mod store;
pub mod ui;
