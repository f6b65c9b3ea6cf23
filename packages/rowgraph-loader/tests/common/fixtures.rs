//! Library schema fixtures
//!
//! ```text
//! author 1 ──< book >── book_tag ──< tag
//! ```
//! Rows have the shape of
//! `author LEFT JOIN book LEFT JOIN book_tag LEFT JOIN tag`.

use rowgraph_loader::{Entity, Loader, LoaderConfig, MapRow, Shared, Value};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub books: Vec<Shared<Book>>,
}

#[derive(Debug, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: Option<i64>,
    #[serde(skip)]
    pub author_name: Option<String>,
    #[serde(skip)]
    pub tags: Vec<Shared<Tag>>,
}

#[derive(Debug, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

/// Descriptors and loader of the library schema
pub struct Library {
    pub author: Entity<Author>,
    pub book: Entity<Book>,
    pub tag: Entity<Tag>,
    pub loader: Loader<Author>,
}

/// author -(0..1:n)- book -(n:m)- tag, main entity author
pub fn library(config: LoaderConfig) -> Library {
    let author = Entity::<Author>::deserialize("author", "id");
    let book = Entity::<Book>::deserialize("book", "id");
    let tag = Entity::<Tag>::deserialize("tag", "id");

    let loader = Loader::of(&author)
        .relation(&author, &book)
        .zero_or_one_to_many("book.author_id")
        .set_many_left(|a: &mut Author, books: Vec<Shared<Book>>| a.books = books)
        .set_zero_or_one_right(|b: &mut Book, a: Option<Shared<Author>>| {
            b.author_name = a.map(|a| a.read().name.clone());
        })
        .and()
        .relation(&book, &tag)
        .many_to_many("book_tag.book_id", "book_tag.tag_id")
        .set_many_left(|b: &mut Book, tags: Vec<Shared<Tag>>| b.tags = tags)
        .config(config)
        .build()
        .expect("library loader is valid");

    Library {
        author,
        book,
        tag,
        loader,
    }
}

pub fn author_row(author: i64) -> MapRow {
    MapRow::new()
        .with("author.id", author)
        .with("author.name", format!("author-{}", author))
        .with("book.id", Value::Null)
        .with("book.title", Value::Null)
        .with("book.author_id", Value::Null)
}

pub fn book_row(author: i64, book: i64) -> MapRow {
    MapRow::new()
        .with("author.id", author)
        .with("author.name", format!("author-{}", author))
        .with("book.id", book)
        .with("book.title", format!("book-{}", book))
        .with("book.author_id", author)
}

pub fn tagged_book_row(author: i64, book: i64, tag: i64) -> MapRow {
    book_row(author, book)
        .with("book_tag.book_id", book)
        .with("book_tag.tag_id", tag)
        .with("tag.id", tag)
        .with("tag.label", format!("tag-{}", tag))
}

/// A book row without an author (outer join from the book side)
pub fn orphan_book_row(book: i64) -> MapRow {
    MapRow::new()
        .with("author.id", Value::Null)
        .with("book.id", book)
        .with("book.title", format!("book-{}", book))
        .with("book.author_id", Value::Null)
}

/// Rows for `(author, Option<book>)` layouts; books always belong to `book % 5 + 1`
pub fn rows_from_layout(layout: &[(i64, Option<i64>)]) -> Vec<MapRow> {
    layout.iter()
        .map(|&(author, book)| match book {
            Some(book) => book_row(book % 5 + 1, book),
            None => author_row(author),
        })
        .collect()
}
