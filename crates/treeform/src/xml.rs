//! XML decoding
//!
//! [`Reader`] turns bytes into a stream of start, text and end events;
//! [`decode`] folds that stream into the canonical tree.

pub mod cursor;
pub mod reader;
pub mod tree;

pub use cursor::Cursor;
pub use reader::{Event, Reader};
pub use tree::{decode, TEXT_KEY};
