use crate::{
    database::{MongoDB, HANDYMEN, REVIEWS},
    models::{
        page_size, CreateReviewRequest, NotificationKind, PaginationQuery, Party, Review,
        ReviewResponse, MAX_COMMENT_LEN, MAX_RATING, MIN_RATING,
    },
    realtime::NotificationHub,
    services::{notification_service, offer_service},
    utils::{parse_object_id, AppError, AppResult},
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};

pub fn validate_review(request: &CreateReviewRequest) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
        return Err(AppError::InvalidRequest(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    if let Some(comment) = &request.comment {
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::InvalidRequest(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }
    }
    Ok(())
}

/// Pipeline update that adds `delta_total` / `delta_count` to the handyman's
/// rating aggregate and recomputes the average in the same write.
pub fn rating_update(delta_total: i64, delta_count: i64) -> Vec<Document> {
    vec![
        doc! {
            "$set": {
                "rating_total": { "$max": [0, { "$add": [{ "$ifNull": ["$rating_total", 0] }, delta_total] }] },
                "review_count": { "$max": [0, { "$add": [{ "$ifNull": ["$review_count", 0] }, delta_count] }] },
                "updated_at": Utc::now().timestamp(),
            }
        },
        doc! {
            "$set": {
                "rating_avg": {
                    "$cond": [
                        { "$gt": ["$review_count", 0] },
                        { "$divide": ["$rating_total", "$review_count"] },
                        0.0
                    ]
                }
            }
        },
    ]
}

async fn adjust_rating(db: &MongoDB, handyman_id: &str, delta_total: i64, delta_count: i64) -> AppResult<()> {
    db.collection::<Document>(HANDYMEN)
        .update_one(
            doc! { "user_id": handyman_id },
            rating_update(delta_total, delta_count),
        )
        .await?;
    Ok(())
}

/// Returns `result` unchanged; on error, `undo` runs first so a half-written
/// review does not block a retry.
async fn undo_on_error<T, U, E, F>(result: AppResult<T>, undo: F) -> AppResult<T>
where
    F: std::future::IntoFuture<Output = Result<U, E>>,
    E: std::fmt::Display,
{
    if let Err(e) = &result {
        log::warn!("⚠️ Rolling back review after failed rating update: {}", e);
        if let Err(undo_err) = undo.await {
            log::error!("❌ Rollback failed: {}", undo_err);
        }
    }
    result
}

pub async fn create_review(
    db: &MongoDB,
    hub: &NotificationHub,
    client_id: &str,
    request: &CreateReviewRequest,
) -> AppResult<ReviewResponse> {
    validate_review(request)?;

    let (offer, party) = offer_service::get_offer_for(db, client_id, &request.offer_id).await?;
    if party != Party::Client {
        return Err(AppError::Forbidden(
            "Only the client of an offer can review it".to_string(),
        ));
    }
    if !offer.status.is_settled() {
        return Err(AppError::Conflict(format!(
            "Cannot review an offer that is {}",
            offer.status
        )));
    }

    let mut review = Review {
        id: None,
        handyman_id: offer.handyman_id.clone(),
        client_id: client_id.to_string(),
        offer_id: offer.id_hex(),
        rating: request.rating,
        comment: request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from),
        created_at: Utc::now().timestamp(),
    };

    // Índice único em offer_id transforma uma segunda review em 409
    let result = db
        .collection::<Review>(REVIEWS)
        .insert_one(&review)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("This offer has already been reviewed".to_string()),
            other => other,
        })?;
    review.id = result.inserted_id.as_object_id();

    let adjusted = adjust_rating(db, &review.handyman_id, i64::from(review.rating), 1).await;
    undo_on_error(
        adjusted,
        db.collection::<Review>(REVIEWS)
            .delete_one(doc! { "offer_id": &review.offer_id, "client_id": client_id }),
    )
    .await?;
    log::info!(
        "⭐ Review {}/5 for handyman {} (offer {})",
        review.rating,
        review.handyman_id,
        review.offer_id
    );

    notification_service::notify_quietly(
        db,
        hub,
        &review.handyman_id,
        NotificationKind::ReviewReceived,
        "New review",
        &format!("You received a {}-star review.", review.rating),
        serde_json::json!({ "offer_id": review.offer_id, "rating": review.rating }),
    )
    .await;

    Ok(ReviewResponse::from(review))
}

pub async fn list_for_handyman(
    db: &MongoDB,
    handyman_id: &str,
    query: &PaginationQuery,
) -> AppResult<Vec<ReviewResponse>> {
    let reviews = db
        .collection::<Review>(REVIEWS)
        .find(doc! { "handyman_id": handyman_id })
        .sort(doc! { "created_at": -1 })
        .skip(query.offset.unwrap_or(0))
        .limit(page_size(query.limit))
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(reviews.into_iter().map(ReviewResponse::from).collect())
}

pub async fn delete_review(db: &MongoDB, user_id: &str, review_id: &str) -> AppResult<()> {
    let id = parse_object_id(review_id, "review")?;

    let review = db
        .collection::<Review>(REVIEWS)
        .find_one_and_delete(doc! { "_id": id, "client_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    adjust_rating(db, &review.handyman_id, -i64::from(review.rating), -1).await?;
    log::info!("🗑️ Review {} deleted by {}", review_id, user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: i32, comment: Option<&str>) -> CreateReviewRequest {
        CreateReviewRequest {
            offer_id: "65f1a2b3c4d5e6f708091a2b".into(),
            rating,
            comment: comment.map(String::from),
        }
    }

    #[test]
    fn test_rating_bounds() {
        for rating in MIN_RATING..=MAX_RATING {
            assert!(validate_review(&request(rating, None)).is_ok());
        }
        assert!(validate_review(&request(0, None)).is_err());
        assert!(validate_review(&request(6, None)).is_err());
        assert!(validate_review(&request(-1, None)).is_err());
    }

    #[test]
    fn test_comment_length() {
        let long = "a".repeat(MAX_COMMENT_LEN + 1);
        assert!(validate_review(&request(5, Some(&long))).is_err());
        assert!(validate_review(&request(5, Some("Great work"))).is_ok());
    }

    #[test]
    fn test_rating_update_pipeline_shape() {
        let pipeline = rating_update(4, 1);
        assert_eq!(pipeline.len(), 2);

        let first = pipeline[0].get_document("$set").unwrap();
        assert!(first.contains_key("rating_total"));
        assert!(first.contains_key("review_count"));

        let second = pipeline[1].get_document("$set").unwrap();
        assert!(second.contains_key("rating_avg"));
    }

    #[tokio::test]
    async fn test_invalid_rating_rejected_before_lookup() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let hub = NotificationHub::new();
        let err = create_review(&db, &hub, "client", &request(9, None)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_with_bad_id() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let err = delete_review(&db, "client", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_failed_rating_update_rolls_back_review() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let undone = AtomicUsize::new(0);

        let result: AppResult<()> = undo_on_error(Err(AppError::Database("write conflict".into())), async {
            undone.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(undone.load(Ordering::SeqCst), 1);

        let result = undo_on_error(Ok(7), async {
            undone.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(())
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(undone.load(Ordering::SeqCst), 1);
    }
}
