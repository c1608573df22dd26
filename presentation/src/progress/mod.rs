//! Progress display for pending replies

pub mod reply;
