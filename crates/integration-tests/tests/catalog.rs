//! Catalog paging and search.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashSet;

use bookstore_core::{PAGE_SIZE, PageRequest, Role};
use bookstore_integration_tests::{BookBuilder, TestContext, at, isbn13};
use bookstore_storefront::services::catalog::CatalogError;

#[tokio::test]
async fn pages_cover_the_catalog_exactly_once() {
    let ctx = TestContext::new();
    let seller = ctx.user("seller@example.com", Role::Seller).await;
    let store = ctx.store(&seller, "Shelf").await;
    for n in 0..45 {
        ctx.book(store, &isbn13(n), &format!("Book {n}"), "9.99").await;
    }
    let catalog = ctx.state.catalog();

    let mut seen = Vec::new();
    for index in 0..3 {
        let page = catalog
            .list_catalog(PageRequest::new(index), None)
            .await
            .unwrap();
        assert_eq!(page.total_items, 45);
        assert_eq!(page.total_pages, 3);
        assert!(page.items.len() <= PAGE_SIZE as usize);
        seen.extend(page.items.into_iter().map(|b| b.isbn));
    }

    assert_eq!(seen.len(), 45);
    let unique: HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), 45);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);

    let beyond = catalog
        .list_catalog(PageRequest::new(3), None)
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
}

#[tokio::test]
async fn public_search_is_case_insensitive_over_title_author_and_category() {
    let ctx = TestContext::new();
    let seller = ctx.user("seller@example.com", Role::Seller).await;
    let store = ctx.store(&seller, "Shelf").await;
    for book in [
        BookBuilder::new(store, &isbn13(1), "Dune").author("Frank Herbert").category("Science Fiction"),
        BookBuilder::new(store, &isbn13(2), "Emma").author("Jane Austen").category("Romance"),
        BookBuilder::new(store, &isbn13(3), "Neuromancer").author("William Gibson").category("Cyberpunk"),
    ] {
        ctx.storage.put_book(book.build()).await;
    }
    let catalog = ctx.state.catalog();

    let titles = |page: bookstore_core::Page<bookstore_storefront::models::Book>| {
        page.items.into_iter().map(|b| b.title).collect::<Vec<_>>()
    };

    let by_title = catalog.list_catalog(PageRequest::new(0), Some("dUNE")).await.unwrap();
    assert_eq!(titles(by_title), vec!["Dune"]);

    let by_author = catalog.list_catalog(PageRequest::new(0), Some("austen")).await.unwrap();
    assert_eq!(titles(by_author), vec!["Emma"]);

    let by_category = catalog.list_catalog(PageRequest::new(0), Some("CYBER")).await.unwrap();
    assert_eq!(titles(by_category), vec!["Neuromancer"]);

    let nothing = catalog.list_catalog(PageRequest::new(0), Some("tolkien")).await.unwrap();
    assert_eq!(nothing.total_items, 0);
    assert!(nothing.items.is_empty());

    let blank = catalog.list_catalog(PageRequest::new(0), Some("   ")).await.unwrap();
    assert_eq!(blank.total_items, 3);
}

#[tokio::test]
async fn store_catalog_searches_titles_only_within_the_store() {
    let ctx = TestContext::new();
    let seller = ctx.user("seller@example.com", Role::Seller).await;
    let other = ctx.user("other@example.com", Role::Seller).await;
    let store = ctx.store(&seller, "Shelf").await;
    let other_store = ctx.store(&other, "Other").await;

    ctx.storage
        .put_book(
            BookBuilder::new(store, &isbn13(1), "The Hobbit")
                .author("Tolkien")
                .created_at(at(1))
                .build(),
        )
        .await;
    ctx.storage
        .put_book(BookBuilder::new(store, &isbn13(2), "Hobbit Companion").created_at(at(2)).build())
        .await;
    ctx.storage
        .put_book(BookBuilder::new(other_store, &isbn13(3), "Hobbit Atlas").build())
        .await;
    let catalog = ctx.state.catalog();

    let hits = catalog
        .list_store_catalog(seller.id, PageRequest::new(0), Some("HOBBIT"))
        .await
        .unwrap();
    let titles: Vec<_> = hits.items.iter().map(|b| b.title.as_str()).collect();
    // Newest first.
    assert_eq!(titles, vec!["Hobbit Companion", "The Hobbit"]);

    let by_author = catalog
        .list_store_catalog(seller.id, PageRequest::new(0), Some("tolkien"))
        .await
        .unwrap();
    assert!(by_author.items.is_empty());
}

#[tokio::test]
async fn store_catalog_without_store_is_store_not_found() {
    let ctx = TestContext::new();
    let seller = ctx.user("seller@example.com", Role::Seller).await;

    let result = ctx
        .state
        .catalog()
        .list_store_catalog(seller.id, PageRequest::new(0), None)
        .await;

    assert!(matches!(result, Err(CatalogError::StoreNotFound)));
}
