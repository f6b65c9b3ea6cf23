//! Flattening helpers for comparing loaded graphs

use rowgraph_loader::Shared;

use super::fixtures::{Author, Book};

/// `(author id, [book ids])` in load order
pub fn author_books(authors: &[Shared<Author>]) -> Vec<(i64, Vec<i64>)> {
    authors
        .iter()
        .map(|a| {
            let a = a.read();
            (a.id, a.books.iter().map(|b| b.read().id).collect())
        })
        .collect()
}

/// `(book id, [tag ids])` for every linked book, in load order
pub fn book_tags(authors: &[Shared<Author>]) -> Vec<(i64, Vec<i64>)> {
    authors
        .iter()
        .flat_map(|a| a.read().books.clone())
        .map(|b| {
            let b = b.read();
            (b.id, b.tags.iter().map(|t| t.read().id).collect())
        })
        .collect()
}

/// Same as [`author_books`] with book lists sorted, for order-insensitive checks
pub fn author_books_sorted(authors: &[Shared<Author>]) -> Vec<(i64, Vec<i64>)> {
    let mut flattened = author_books(authors);
    flattened.sort_by_key(|(id, _)| *id);
    for (_, books) in &mut flattened {
        books.sort_unstable();
    }
    flattened
}

pub fn assert_no_duplicate_books(authors: &[Shared<Author>]) {
    for (author, books) in author_books(authors) {
        let mut unique = books.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(
            unique.len(),
            books.len(),
            "author {} has duplicate books: {:?}",
            author,
            books
        );
    }
}

/// `(book id, linked author name)`
pub fn book_author(book: &Shared<Book>) -> (i64, Option<String>) {
    let book = book.read();
    (book.id, book.author_name.clone())
}
