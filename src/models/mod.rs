pub mod folder;
pub mod note;
pub mod tag;

pub use folder::Folder;
pub use note::{Note, NoteResponse};
pub use tag::Tag;
