// linktitles-store: SQLite page store backing the linker outside a wiki host

pub mod db;
pub mod import;
pub mod pages;

pub use db::PageDb;
pub use import::{import_dir, ImportReport};
pub use pages::{PageStore, Revision, StoredPage};
