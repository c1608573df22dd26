//! Use cases (application services)

pub mod chat_session;
