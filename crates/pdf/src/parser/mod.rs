//! Page content parsing: backend access, text spans and word boxes.

pub mod backend;
pub mod layout;
pub mod words;
