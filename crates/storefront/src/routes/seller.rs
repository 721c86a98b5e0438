//! Seller book management route handlers.
//!
//! Every handler requires a seller session. Books outside the seller's own
//! store answer 404.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tracing::instrument;

use bookstore_core::Page;

use super::books::CatalogQuery;
use super::isbn_param;
use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::models::{Book, BookDetails, BookDraft};
use crate::services::seller::ImageUpload;
use crate::state::AppState;

/// Name of the multipart part carrying the cover image.
const IMAGE_FIELD: &str = "image";

/// One page of the seller's store, optionally filtered by title.
///
/// # Errors
///
/// Returns 404 if the seller has no store.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Book>>, AppError> {
    let page = state
        .catalog()
        .list_store_catalog(user.id, query.page_request(), query.q.as_deref())
        .await?;
    Ok(Json(page))
}

/// Create a book from a multipart form: `isbn`, `title`, `author`,
/// `category`, `pages`, `price`, optional `description`, and an `image` file.
///
/// # Errors
///
/// Returns 400 for missing or invalid fields (the image included) and 409
/// if the ISBN is taken.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn create(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let (draft, image) = read_book_upload(multipart).await?;
    let book = state
        .seller_books()
        .create_book(user.id, draft, image)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// One of the seller's books.
///
/// # Errors
///
/// Returns 404 if the book is missing or belongs to another store.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<Book>, AppError> {
    let isbn = isbn_param(&isbn)?;
    let book = state.seller_books().seller_book(user.id, &isbn).await?;
    Ok(Json(book))
}

/// Replace a book's editable attributes. The ISBN, image and creation time
/// never change.
///
/// # Errors
///
/// Returns 400 for invalid input, 404 if the book is not the seller's and
/// 409 if it changed concurrently.
#[instrument(skip(state, user, details), fields(user_id = %user.id))]
pub async fn update(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Json(details): Json<BookDetails>,
) -> Result<Json<Book>, AppError> {
    let isbn = isbn_param(&isbn)?;
    let book = state
        .seller_books()
        .edit_book(user.id, &isbn, details)
        .await?;
    Ok(Json(book))
}

/// Delete one of the seller's books.
///
/// # Errors
///
/// Returns 404 if the book is not the seller's and 409 if orders
/// reference it.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn destroy(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<StatusCode, AppError> {
    let isbn = isbn_param(&isbn)?;
    state.seller_books().delete_book(user.id, &isbn).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Multipart parsing
// =============================================================================

fn bad_multipart(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Collect the text fields and the image part of a book upload.
async fn read_book_upload(
    mut multipart: Multipart,
) -> Result<(BookDraft, Option<ImageUpload>), AppError> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            image = Some(ImageUpload {
                file_name,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(bad_multipart)?;
            fields.insert(name, value);
        }
    }

    Ok((draft_from_fields(fields)?, image))
}

/// Build a draft from form fields. Semantic checks happen in the service.
fn draft_from_fields(mut fields: HashMap<String, String>) -> Result<BookDraft, AppError> {
    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| AppError::BadRequest(format!("missing field `{name}`")))
    };

    let isbn = take("isbn")?;
    let title = take("title")?;
    let author = take("author")?;
    let category = take("category")?;
    let pages = take("pages")?
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::BadRequest("pages must be a whole number".to_owned()))?;
    let price = take("price")?
        .trim()
        .parse::<Decimal>()
        .map_err(|_| AppError::BadRequest("price must be a decimal number".to_owned()))?;
    let description = take("description").unwrap_or_default();

    Ok(BookDraft {
        isbn,
        details: BookDetails {
            title,
            author,
            category,
            pages,
            price,
            description,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_draft_from_fields() {
        let draft = draft_from_fields(form(&[
            ("isbn", "0306406152"),
            ("title", "Dune"),
            ("author", "Herbert"),
            ("category", "SF"),
            ("pages", " 412 "),
            ("price", "9.99"),
        ]))
        .unwrap();

        assert_eq!(draft.isbn, "0306406152");
        assert_eq!(draft.details.pages, 412);
        assert_eq!(draft.details.price, Decimal::new(999, 2));
        assert!(draft.details.description.is_empty());
    }

    #[test]
    fn test_draft_rejects_missing_and_malformed_fields() {
        let missing = draft_from_fields(form(&[("isbn", "0306406152")]));
        assert!(matches!(missing, Err(AppError::BadRequest(msg)) if msg.contains("title")));

        let bad_pages = draft_from_fields(form(&[
            ("isbn", "0306406152"),
            ("title", "Dune"),
            ("author", "Herbert"),
            ("category", "SF"),
            ("pages", "many"),
            ("price", "9.99"),
        ]));
        assert!(matches!(bad_pages, Err(AppError::BadRequest(_))));
    }
}
