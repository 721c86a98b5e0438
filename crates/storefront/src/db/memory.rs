//! In-memory storage adapter for tests.
//!
//! All tables sit behind one async mutex. A checkout transaction holds the
//! lock for its whole lifetime together with a snapshot of the tables taken
//! at `begin_checkout`; dropping or rolling back restores the snapshot.
//!
//! [`FaultPoint`]s make a chosen checkout write fail once, which lets tests
//! observe rollback without a database.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bookstore_core::{Email, Isbn, OrderId, Page, PageRequest, Role, StoreId, UserId};

use super::{
    CartRepository, CatalogRepository, CheckoutRepository, CheckoutTransaction, OrderRepository,
    RepositoryError, Storage, StoreRepository, UserRepository,
};
use crate::models::{
    Book, BookDetails, CartLine, NewBook, NewOrderDetail, Order, OrderDetail, OrderWithDetails,
    PricedCartLine, Store, User, UserWithPassword,
};

/// A checkout write that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Creating the order header.
    InsertOrder,
    /// Creating the `nth` detail row of a transaction (1-based).
    InsertOrderDetail { nth: usize },
    /// Deleting the cart lines.
    ClearCart,
    /// Committing.
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, UserWithPassword>,
    stores: BTreeMap<StoreId, Store>,
    books: BTreeMap<Isbn, Book>,
    cart: BTreeMap<(UserId, Isbn), i32>,
    orders: BTreeMap<OrderId, Order>,
    details: BTreeMap<(OrderId, Isbn), OrderDetail>,
    next_user: i32,
    next_store: i32,
    next_order: i32,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    faults: Vec<FaultPoint>,
}

impl Inner {
    /// Consume a matching armed fault, if any.
    fn trip(&mut self, point: FaultPoint) -> Result<(), RepositoryError> {
        if let Some(pos) = self.faults.iter().position(|f| *f == point) {
            self.faults.remove(pos);
            return Err(RepositoryError::Storage(format!("injected fault at {point:?}")));
        }
        Ok(())
    }
}

/// Storage kept entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next checkout write at `point` fail once.
    pub async fn inject_fault(&self, point: FaultPoint) {
        self.inner.lock().await.faults.push(point);
    }

    /// Insert or replace a book directly, bypassing validation.
    pub async fn put_book(&self, book: Book) {
        self.inner
            .lock()
            .await
            .tables
            .books
            .insert(book.isbn.clone(), book);
    }

    /// Number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.inner.lock().await.tables.orders.len()
    }

    /// Number of order details stored, across all orders.
    pub async fn order_detail_count(&self) -> usize {
        self.inner.lock().await.tables.details.len()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn paginate(books: Vec<Book>, page: PageRequest) -> Page<Book> {
    let total = books.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = books.into_iter().skip(offset).take(limit).collect();
    Page::new(items, page, total)
}

fn priced_lines(tables: &Tables, user: UserId) -> Vec<PricedCartLine> {
    tables
        .cart
        .iter()
        .filter(|((owner, _), _)| *owner == user)
        .filter_map(|((_, isbn), quantity)| {
            tables.books.get(isbn).map(|book| PricedCartLine {
                isbn: isbn.clone(),
                title: book.title.clone(),
                unit_price: book.price,
                quantity: *quantity,
            })
        })
        .collect()
}

#[async_trait]
impl CatalogRepository for MemoryStorage {
    async fn list_books(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        let inner = self.inner.lock().await;
        let needle = search.map(str::to_lowercase);
        // BTreeMap iteration is already ISBN order.
        let books = inner
            .tables
            .books
            .values()
            .filter(|b| {
                needle.as_deref().is_none_or(|n| {
                    contains_ci(&b.title, n) || contains_ci(&b.category, n) || contains_ci(&b.author, n)
                })
            })
            .cloned()
            .collect();
        Ok(paginate(books, page))
    }

    async fn list_store_books(
        &self,
        store_id: StoreId,
        title_search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        let inner = self.inner.lock().await;
        let needle = title_search.map(str::to_lowercase);
        let mut books: Vec<Book> = inner
            .tables
            .books
            .values()
            .filter(|b| b.store_id == store_id)
            .filter(|b| needle.as_deref().is_none_or(|n| contains_ci(&b.title, n)))
            .cloned()
            .collect();
        books.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.isbn.cmp(&b.isbn))
        });
        Ok(paginate(books, page))
    }

    async fn get_book(&self, isbn: &Isbn) -> Result<Option<Book>, RepositoryError> {
        Ok(self.inner.lock().await.tables.books.get(isbn).cloned())
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.tables.books.contains_key(&book.isbn) {
            return Err(RepositoryError::Conflict(
                "a book with this ISBN already exists".to_owned(),
            ));
        }
        if !inner.tables.stores.contains_key(&book.store_id) {
            return Err(RepositoryError::NotFound);
        }
        let book = book.into_book();
        inner.tables.books.insert(book.isbn.clone(), book.clone());
        Ok(book)
    }

    async fn update_book(
        &self,
        store_id: StoreId,
        isbn: &Isbn,
        details: &BookDetails,
    ) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock().await;
        match inner.tables.books.get_mut(isbn) {
            Some(book) if book.store_id == store_id => {
                book.title.clone_from(&details.title);
                book.author.clone_from(&details.author);
                book.category.clone_from(&details.category);
                book.pages = details.pages;
                book.price = details.price;
                book.description.clone_from(&details.description);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_book(&self, store_id: StoreId, isbn: &Isbn) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .tables
            .books
            .get(isbn)
            .is_some_and(|b| b.store_id == store_id);
        if !owned {
            return Ok(0);
        }
        if inner.tables.details.keys().any(|(_, i)| i == isbn) {
            return Err(RepositoryError::Conflict(
                "book is referenced by orders".to_owned(),
            ));
        }
        inner.tables.books.remove(isbn);
        inner.tables.cart.retain(|(_, i), _| i != isbn);
        Ok(1)
    }
}

#[async_trait]
impl StoreRepository for MemoryStorage {
    async fn store_for_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tables
            .stores
            .values()
            .find(|s| s.owner_id == owner)
            .cloned())
    }

    async fn create_store(&self, owner: UserId, name: &str) -> Result<Store, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if !inner.tables.users.contains_key(&owner) {
            return Err(RepositoryError::NotFound);
        }
        if inner.tables.stores.values().any(|s| s.owner_id == owner) {
            return Err(RepositoryError::Conflict(
                "this seller already owns a store".to_owned(),
            ));
        }
        inner.tables.next_store += 1;
        let store = Store {
            id: StoreId::new(inner.tables.next_store),
            owner_id: owner,
            name: name.to_owned(),
        };
        inner.tables.stores.insert(store.id, store.clone());
        Ok(store)
    }
}

#[async_trait]
impl CartRepository for MemoryStorage {
    async fn add_to_cart(&self, user: UserId, isbn: &Isbn) -> Result<CartLine, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if !inner.tables.books.contains_key(isbn) || !inner.tables.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }
        let quantity = inner
            .tables
            .cart
            .entry((user, isbn.clone()))
            .and_modify(|q| *q += 1)
            .or_insert(1);
        Ok(CartLine {
            user_id: user,
            isbn: isbn.clone(),
            quantity: *quantity,
        })
    }

    async fn cart_lines(&self, user: UserId) -> Result<Vec<PricedCartLine>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(priced_lines(&inner.tables, user))
    }
}

#[async_trait]
impl OrderRepository for MemoryStorage {
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<Order> = inner
            .tables
            .orders
            .values()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get_order(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Option<OrderWithDetails>, RepositoryError> {
        let inner = self.inner.lock().await;
        let Some(header) = inner.tables.orders.get(&order).filter(|o| o.user_id == user) else {
            return Ok(None);
        };
        let details = inner
            .tables
            .details
            .values()
            .filter(|d| d.order_id == order)
            .cloned()
            .collect();
        Ok(Some(OrderWithDetails {
            order: header.clone(),
            details,
        }))
    }
}

#[async_trait]
impl UserRepository for MemoryStorage {
    async fn get_user_for_login(
        &self,
        email: &Email,
    ) -> Result<Option<UserWithPassword>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tables
            .users
            .values()
            .find(|u| u.user.email == *email)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .get_user_for_login(email)
            .await?
            .map(|row| row.user))
    }

    async fn create_user(
        &self,
        email: &Email,
        role: Role,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if inner.tables.users.values().any(|u| u.user.email == *email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        inner.tables.next_user += 1;
        let user = User {
            id: UserId::new(inner.tables.next_user),
            email: email.clone(),
            role,
            created_at: Utc::now(),
        };
        inner.tables.users.insert(
            user.id,
            UserWithPassword {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }
}

/// A checkout holding the storage lock until it finishes.
pub struct MemoryCheckout {
    guard: OwnedMutexGuard<Inner>,
    snapshot: Option<Tables>,
    details_written: usize,
}

impl MemoryCheckout {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.guard.tables = snapshot;
        }
    }
}

impl Drop for MemoryCheckout {
    fn drop(&mut self) {
        self.restore();
    }
}

#[async_trait]
impl CheckoutRepository for MemoryStorage {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>, RepositoryError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let snapshot = Some(guard.tables.clone());
        Ok(Box::new(MemoryCheckout {
            guard,
            snapshot,
            details_written: 0,
        }))
    }
}

#[async_trait]
impl CheckoutTransaction for MemoryCheckout {
    async fn lock_cart(&mut self, user: UserId) -> Result<Vec<PricedCartLine>, RepositoryError> {
        Ok(priced_lines(&self.guard.tables, user))
    }

    async fn insert_order(
        &mut self,
        user: UserId,
        ordered_at: DateTime<Utc>,
        total: Decimal,
    ) -> Result<Order, RepositoryError> {
        self.guard.trip(FaultPoint::InsertOrder)?;
        let tables = &mut self.guard.tables;
        tables.next_order += 1;
        let order = Order {
            id: OrderId::new(tables.next_order),
            user_id: user,
            ordered_at,
            total,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_detail(
        &mut self,
        order: OrderId,
        detail: &NewOrderDetail,
    ) -> Result<OrderDetail, RepositoryError> {
        self.details_written += 1;
        self.guard.trip(FaultPoint::InsertOrderDetail {
            nth: self.details_written,
        })?;
        let tables = &mut self.guard.tables;
        if !tables.orders.contains_key(&order) || !tables.books.contains_key(&detail.isbn) {
            return Err(RepositoryError::NotFound);
        }
        let key = (order, detail.isbn.clone());
        if tables.details.contains_key(&key) {
            return Err(RepositoryError::Conflict(
                "duplicate order detail".to_owned(),
            ));
        }
        let row = OrderDetail {
            order_id: order,
            isbn: detail.isbn.clone(),
            quantity: detail.quantity,
            unit_price: detail.unit_price,
        };
        tables.details.insert(key, row.clone());
        Ok(row)
    }

    async fn clear_cart(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        self.guard.trip(FaultPoint::ClearCart)?;
        let cart = &mut self.guard.tables.cart;
        let before = cart.len();
        cart.retain(|(owner, _), _| *owner != user);
        Ok((before - cart.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut this = self;
        this.guard.trip(FaultPoint::Commit)?;
        this.snapshot = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        let mut this = self;
        this.restore();
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStorage, UserId, Isbn) {
        let storage = MemoryStorage::new();
        let seller = storage
            .create_user(&Email::parse("seller@example.com").unwrap(), Role::Seller, "x")
            .await
            .unwrap();
        let customer = storage
            .create_user(&Email::parse("buyer@example.com").unwrap(), Role::Customer, "x")
            .await
            .unwrap();
        let store = storage.create_store(seller.id, "Shelf").await.unwrap();
        let isbn = Isbn::parse("0306406152").unwrap();
        storage
            .put_book(Book {
                isbn: isbn.clone(),
                title: "Title".to_owned(),
                author: "Author".to_owned(),
                category: "Category".to_owned(),
                pages: 100,
                price: Decimal::new(1000, 2),
                description: String::new(),
                image_url: "images/0306406152.jpg".to_owned(),
                created_at: Utc::now(),
                store_id: store.id,
            })
            .await;
        (storage, customer.id, isbn)
    }

    #[tokio::test]
    async fn test_dropped_checkout_restores_tables() {
        let (storage, user, isbn) = seeded().await;
        storage.add_to_cart(user, &isbn).await.unwrap();

        {
            let mut tx = storage.begin_checkout().await.unwrap();
            tx.insert_order(user, Utc::now(), Decimal::ONE).await.unwrap();
            tx.clear_cart(user).await.unwrap();
        }

        assert_eq!(storage.order_count().await, 0);
        assert_eq!(storage.cart_lines(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fault_fires_once() {
        let (storage, user, _) = seeded().await;
        storage.inject_fault(FaultPoint::InsertOrder).await;

        let mut tx = storage.begin_checkout().await.unwrap();
        let first = tx.insert_order(user, Utc::now(), Decimal::ONE).await;
        assert!(matches!(first, Err(RepositoryError::Storage(_))));
        let second = tx.insert_order(user, Utc::now(), Decimal::ONE).await;
        assert!(second.is_ok());
        tx.commit().await.unwrap();

        assert_eq!(storage.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_second_store_for_owner_conflicts() {
        let (storage, _, _) = seeded().await;
        let seller = storage
            .get_user_by_email(&Email::parse("seller@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        let second = storage.create_store(seller.id, "Another").await;
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_referenced_book_conflicts() {
        let (storage, user, isbn) = seeded().await;
        let book = storage.get_book(&isbn).await.unwrap().unwrap();

        let mut tx = storage.begin_checkout().await.unwrap();
        let order = tx.insert_order(user, Utc::now(), book.price).await.unwrap();
        tx.insert_order_detail(
            order.id,
            &NewOrderDetail {
                isbn: isbn.clone(),
                quantity: 1,
                unit_price: book.price,
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let result = storage.delete_book(book.store_id, &isbn).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }
}
