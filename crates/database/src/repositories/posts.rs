use crate::error::{DatabaseError, Result};
use civic_models::{NewPost, NewPostMedia, Post, PostMedia, PostWithMedia};
use sqlx::PgPool;

pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a post and its media in one transaction, media ordered as given
    pub async fn create(&self, new_post: &NewPost, actor_id: i64) -> Result<PostWithMedia> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO tbl_post (user_id, title, body, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(new_post.user_id)
        .bind(&new_post.title)
        .bind(&new_post.body)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut media = Vec::with_capacity(new_post.media.len());
        for (index, item) in new_post.media.iter().enumerate() {
            let row = sqlx::query_as::<_, PostMedia>(
                r#"
                INSERT INTO tbl_post_media (post_id, media_type, url, sort_order, created_by, updated_by)
                VALUES ($1, $2, $3, $4, $5, $5)
                RETURNING *
                "#,
            )
            .bind(post.id)
            .bind(item.media_type)
            .bind(&item.url)
            .bind(index as i32)
            .bind(actor_id)
            .fetch_one(&mut *tx)
            .await?;
            media.push(row);
        }

        tx.commit().await?;

        Ok(PostWithMedia { post, media })
    }

    /// Append one media item after the post's current last item
    ///
    /// The post row is locked for the duration so concurrent appends are
    /// numbered one after another.
    pub async fn add_media(&self, post_id: i64, item: &NewPostMedia, actor_id: i64) -> Result<PostMedia> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_as::<_, (i64,)>("SELECT id FROM tbl_post WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Post", &post_id.to_string()))?;

        let media = sqlx::query_as::<_, PostMedia>(
            r#"
            INSERT INTO tbl_post_media (post_id, media_type, url, sort_order, created_by, updated_by)
            SELECT $1, $2, $3, COALESCE(MAX(sort_order) + 1, 0), $4, $4
            FROM tbl_post_media WHERE post_id = $1
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(item.media_type)
        .bind(&item.url)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(media)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM tbl_post WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Post", &id.to_string()))?;

        Ok(post)
    }

    /// Post with its active media in display order
    pub async fn find_with_media(&self, id: i64) -> Result<PostWithMedia> {
        let post = self.find_by_id(id).await?;

        let media = sqlx::query_as::<_, PostMedia>(
            "SELECT * FROM tbl_post_media WHERE post_id = $1 AND status = 1 ORDER BY sort_order",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PostWithMedia { post, media })
    }

    pub async fn list(
        &self,
        user_id: Option<i64>,
        status: Option<i16>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM tbl_post
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::SMALLINT IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn set_status(&self, id: i64, status: i16, actor_id: i64) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            "UPDATE tbl_post SET status = $1, updated_by = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(actor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Post", &id.to_string()))?;

        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DatabaseConfig};
    use civic_models::MediaType;

    fn photo(url: &str) -> NewPostMedia {
        NewPostMedia {
            media_type: MediaType::Photo,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_concurrent_media_appends_are_numbered_in_turn() {
        let db = Database::new(DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        db.migrate().await.expect("Failed to migrate");

        let (user_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO tbl_user (name, contact_number, status) VALUES ('Media Tester', '+919811100044', 1)
            ON CONFLICT (contact_number) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .fetch_one(db.pool())
        .await
        .unwrap();

        let posts = PostRepository::new(db.pool().clone());
        let created = posts
            .create(
                &NewPost {
                    user_id,
                    title: "Ward cleanup".to_string(),
                    body: None,
                    media: vec![photo("https://example.org/0.jpg")],
                },
                user_id,
            )
            .await
            .unwrap();
        let post_id = created.post.id;

        let (m1, m2, m3, m4) = (
            photo("https://example.org/1.jpg"),
            photo("https://example.org/2.jpg"),
            photo("https://example.org/3.jpg"),
            photo("https://example.org/4.jpg"),
        );
        let (a, b, c, d) = tokio::join!(
            posts.add_media(post_id, &m1, user_id),
            posts.add_media(post_id, &m2, user_id),
            posts.add_media(post_id, &m3, user_id),
            posts.add_media(post_id, &m4, user_id),
        );
        for result in [a, b, c, d] {
            result.unwrap();
        }

        let orders: Vec<i32> = posts
            .find_with_media(post_id)
            .await
            .unwrap()
            .media
            .iter()
            .map(|m| m.sort_order)
            .collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_media_for_missing_post_is_not_found() {
        let db = Database::new(DatabaseConfig::from_env())
            .await
            .expect("Failed to connect to database");
        db.migrate().await.expect("Failed to migrate");

        let err = PostRepository::new(db.pool().clone())
            .add_media(i64::MAX, &photo("https://example.org/x.jpg"), 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
