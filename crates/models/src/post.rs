use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Photo,
    Video,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: Option<String>,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostMedia {
    pub id: i64,
    pub post_id: i64,
    pub media_type: MediaType,
    pub url: String,
    pub sort_order: i32,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithMedia {
    #[serde(flatten)]
    pub post: Post,
    pub media: Vec<PostMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPost {
    pub user_id: i64,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub body: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub media: Vec<NewPostMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPostMedia {
    pub media_type: MediaType,

    #[validate(url)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_wire_format() {
        let json = serde_json::to_string(&MediaType::Photo).unwrap();
        assert_eq!(json, "\"PHOTO\"");

        let parsed: MediaType = serde_json::from_str("\"VIDEO\"").unwrap();
        assert_eq!(parsed, MediaType::Video);
    }

    #[test]
    fn test_new_post_rejects_bad_media_url() {
        let post = NewPost {
            user_id: 1,
            title: "Ward meeting".to_string(),
            body: None,
            media: vec![NewPostMedia {
                media_type: MediaType::Photo,
                url: "not a url".to_string(),
            }],
        };
        assert!(post.validate().is_err());
    }
}
