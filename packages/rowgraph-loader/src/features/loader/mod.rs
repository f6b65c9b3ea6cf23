//! Graph reducer: drives the fold from rows to linked objects
//!
//! ```rust,ignore
//! let author = Entity::<Author>::deserialize("author", "id");
//! let book = Entity::<Book>::deserialize("book", "id");
//!
//! let loader = Loader::of(&author)
//!     .relation(&author, &book)
//!     .one_to_many("book.author_id")
//!     .set_many_left(|a: &mut Author, books| a.books = books)
//!     .build()?;
//!
//! let authors = loader.load(&rows)?;
//! ```

pub mod builder;
pub mod parallel;
pub mod reducer;

pub use builder::{LoaderBuilder, RelationBuilder};
pub use reducer::Loader;
