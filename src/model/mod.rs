//! Core data model: sessions, line access and record formatting

pub mod line_locator;
pub mod line_rewriter;
pub mod record;
pub mod session;
