//! Post storage: posts with their likes and comments.

use std::collections::HashMap;

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// A like on a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    /// Public identifier of the user who liked the post
    pub user: String,
}

/// A comment on a post.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub uuid: String,
    /// Public identifier of the author
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub created_at: String,
}

/// A post with its likes and comments, both newest first.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub uuid: String,
    /// Public identifier of the author
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    uuid: String,
    user_uuid: String,
    text: String,
    name: String,
    avatar: String,
    created_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            user: row.user_uuid,
            text: row.text,
            name: row.name,
            avatar: row.avatar,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    post_id: i64,
    user_uuid: String,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    uuid: String,
    user_uuid: String,
    text: String,
    name: String,
    avatar: String,
    created_at: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            user: row.user_uuid,
            text: row.text,
            name: row.name,
            avatar: row.avatar,
            created_at: row.created_at,
        }
    }
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post. Returns the post UUID.
    pub async fn create(
        &self,
        user_id: i64,
        text: &str,
        name: &str,
        avatar: &str,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO posts (uuid, user_id, text, name, avatar) VALUES (?, ?, ?, ?, ?)")
            .bind(&uuid)
            .bind(user_id)
            .bind(text)
            .bind(name)
            .bind(avatar)
            .execute(&self.pool)
            .await?;

        Ok(uuid)
    }

    /// Get a post by UUID with its likes and comments.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT p.id, p.uuid, u.uuid AS user_uuid, p.text, p.name, p.avatar, p.created_at
             FROM posts p JOIN users u ON u.id = p.user_id
             WHERE p.uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut post = Post::from(row);
        post.likes = self.likes(post.id).await?;
        post.comments = self.comments(post.id).await?;
        Ok(Some(post))
    }

    /// List all posts, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, sqlx::Error> {
        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT p.id, p.uuid, u.uuid AS user_uuid, p.text, p.name, p.avatar, p.created_at
             FROM posts p JOIN users u ON u.id = p.user_id
             ORDER BY p.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let likes: Vec<LikeRow> = sqlx::query_as(
            "SELECT l.post_id, u.uuid AS user_uuid
             FROM post_likes l JOIN users u ON u.id = l.user_id
             ORDER BY l.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let comments: Vec<CommentRow> = sqlx::query_as(
            "SELECT c.id, c.post_id, c.uuid, u.uuid AS user_uuid, c.text, c.name, c.avatar, c.created_at
             FROM comments c JOIN users u ON u.id = c.user_id
             ORDER BY c.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut likes_by_post: HashMap<i64, Vec<Like>> = HashMap::new();
        for row in likes {
            likes_by_post.entry(row.post_id).or_default().push(Like {
                user: row.user_uuid,
            });
        }

        let mut comments_by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in comments {
            comments_by_post
                .entry(row.post_id)
                .or_default()
                .push(Comment::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut post = Post::from(row);
                post.likes = likes_by_post.remove(&post.id).unwrap_or_default();
                post.comments = comments_by_post.remove(&post.id).unwrap_or_default();
                post
            })
            .collect())
    }

    /// Delete a post. Likes and comments go with it.
    pub async fn delete(&self, post_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Like a post. Returns false if the user already liked it.
    pub async fn add_like(&self, post_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?, ?)")
                .bind(post_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a like. Returns false if the user had not liked the post.
    pub async fn remove_like(&self, post_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Likes on a post, newest first.
    pub async fn likes(&self, post_id: i64) -> Result<Vec<Like>, sqlx::Error> {
        let rows: Vec<LikeRow> = sqlx::query_as(
            "SELECT l.post_id, u.uuid AS user_uuid
             FROM post_likes l JOIN users u ON u.id = l.user_id
             WHERE l.post_id = ?
             ORDER BY l.id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Like {
                user: row.user_uuid,
            })
            .collect())
    }

    /// Add a comment to a post. Returns the comment UUID.
    pub async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        text: &str,
        name: &str,
        avatar: &str,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO comments (uuid, post_id, user_id, text, name, avatar) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&uuid)
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .bind(name)
        .bind(avatar)
        .execute(&self.pool)
        .await?;

        Ok(uuid)
    }

    /// Get a comment of a post by its UUID.
    pub async fn get_comment(
        &self,
        post_id: i64,
        comment_uuid: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let row: Option<CommentRow> = sqlx::query_as(
            "SELECT c.id, c.post_id, c.uuid, u.uuid AS user_uuid, c.text, c.name, c.avatar, c.created_at
             FROM comments c JOIN users u ON u.id = c.user_id
             WHERE c.post_id = ? AND c.uuid = ?",
        )
        .bind(post_id)
        .bind(comment_uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Comment::from))
    }

    /// Delete a single comment.
    pub async fn delete_comment(&self, comment_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Comments on a post, newest first.
    pub async fn comments(&self, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT c.id, c.post_id, c.uuid, u.uuid AS user_uuid, c.text, c.name, c.avatar, c.created_at
             FROM comments c JOIN users u ON u.id = c.user_id
             WHERE c.post_id = ?
             ORDER BY c.id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}
