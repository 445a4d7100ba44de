pub mod cursor;
pub mod writer;

pub use cursor::PostingCursor;
pub use writer::append;
