//! Comment service and comment-tree assembly
//!
//! Comments are stored flat with an optional parent. Reads group them into
//! a tree in one linear pass.

use crate::auth::{ensure_owner, require_user, AuthProvider};
use crate::config::QuillConfig;
use crate::error::QuillError;
use quill_store::{Collection, Comment, EntityId, EntityKind, Post, User};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Comment with its replies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    /// The comment
    pub comment: Comment,
    /// Author profile, if registered
    pub author: Option<User>,
    /// Replies, oldest first
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including this one
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::len).sum::<usize>()
    }
}

/// Group flat comments into a forest
///
/// Roots and replies are ordered oldest first. A comment whose parent is
/// missing from `comments` becomes a root. Comments caught in a parent
/// cycle are dropped.
#[must_use]
pub fn build_tree(
    mut comments: Vec<Comment>,
    authors: &HashMap<EntityId, User>,
) -> Vec<CommentNode> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let present: HashSet<EntityId> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<EntityId, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children, authors))
        .collect()
}

fn attach(
    comment: Comment,
    children: &mut HashMap<EntityId, Vec<Comment>>,
    authors: &HashMap<EntityId, User>,
) -> CommentNode {
    // removing the entry makes every comment reachable at most once
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach(reply, children, authors))
        .collect();
    CommentNode {
        author: authors.get(&comment.author_id).cloned(),
        comment,
        replies,
    }
}

/// Comment operations
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn Collection<Comment>>,
    posts: Arc<dyn Collection<Post>>,
    users: Arc<dyn Collection<User>>,
    auth: Arc<dyn AuthProvider>,
    config: Arc<QuillConfig>,
}

impl CommentService {
    /// Create service
    #[must_use]
    pub fn new(
        comments: Arc<dyn Collection<Comment>>,
        posts: Arc<dyn Collection<Post>>,
        users: Arc<dyn Collection<User>>,
        auth: Arc<dyn AuthProvider>,
        config: Arc<QuillConfig>,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
            auth,
            config,
        }
    }

    /// Comment on a post, optionally replying to another comment
    ///
    /// # Errors
    /// `Unauthenticated`, `Validation` for empty or oversized bodies and
    /// parents on another post, `NotFound` for a missing post or parent
    pub async fn add_comment(
        &self,
        post_id: EntityId,
        body: &str,
        parent_id: Option<EntityId>,
    ) -> Result<Comment, QuillError> {
        let author_id = require_user(self.auth.as_ref()).await?;
        let body = body.trim();
        if body.is_empty() {
            return Err(QuillError::validation("comment cannot be empty"));
        }
        let max = self.config.content.max_comment_len;
        if body.chars().count() > max {
            return Err(QuillError::validation(format!("comment cannot exceed {max} characters")));
        }

        self.posts.require(post_id).await?;
        let mut comment = Comment::new(post_id, author_id, body);
        if let Some(parent_id) = parent_id {
            let parent = self.comments.require(parent_id).await?;
            if parent.post_id != post_id {
                return Err(QuillError::validation("reply must be on the same post as its parent"));
            }
            comment = comment.reply_to(parent_id);
        }

        self.comments.insert(comment.clone()).await?;
        tracing::info!("User {} commented {} on post {}", author_id, comment.id, post_id);
        Ok(comment)
    }

    /// Delete the current user's comment and every reply beneath it
    ///
    /// # Errors
    /// `Unauthenticated`, `NotFound`, `NotAuthorized`
    pub async fn delete_comment(&self, id: EntityId) -> Result<usize, QuillError> {
        let current = require_user(self.auth.as_ref()).await?;
        let comment = self.comments.require(id).await?;
        ensure_owner(comment.author_id, current, "delete this comment")?;

        let siblings: Vec<Comment> = self
            .comments
            .all()
            .await?
            .into_iter()
            .filter(|c| c.post_id == comment.post_id)
            .collect();

        let mut doomed = vec![id];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let parent = doomed[cursor];
            doomed.extend(
                siblings
                    .iter()
                    .filter(|c| c.parent_id == Some(parent) && !doomed.contains(&c.id))
                    .map(|c| c.id)
                    .collect::<Vec<_>>(),
            );
            cursor += 1;
        }

        for doomed_id in &doomed {
            self.comments.delete(*doomed_id).await?;
        }
        tracing::info!("Deleted comment {} with {} replies", id, doomed.len() - 1);
        Ok(doomed.len())
    }

    /// All comments of a post as a tree
    ///
    /// # Errors
    /// `NotFound` for a missing post
    pub async fn comment_tree(&self, post_id: EntityId) -> Result<Vec<CommentNode>, QuillError> {
        if self.posts.get(post_id).await?.is_none() {
            return Err(QuillError::not_found(EntityKind::Post, post_id));
        }

        let comments: Vec<Comment> = self
            .comments
            .all()
            .await?
            .into_iter()
            .filter(|c| c.post_id == post_id)
            .collect();

        let mut authors = HashMap::new();
        for author_id in comments.iter().map(|c| c.author_id).collect::<HashSet<_>>() {
            if let Some(user) = self.users.get(author_id).await? {
                authors.insert(author_id, user);
            }
        }

        Ok(build_tree(comments, &authors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn at(post: EntityId, parent: Option<EntityId>, offset_secs: i64) -> Comment {
        let mut c = Comment::new(post, EntityId::new(), "text");
        c.parent_id = parent;
        c.created_at = Utc::now() + Duration::seconds(offset_secs);
        c
    }

    #[test]
    fn tree_groups_replies_under_parents() {
        let post = EntityId::new();
        let root = at(post, None, 0);
        let reply = at(post, Some(root.id), 1);
        let nested = at(post, Some(reply.id), 2);
        let other_root = at(post, None, 3);

        let tree = build_tree(
            vec![nested.clone(), other_root.clone(), reply.clone(), root.clone()],
            &HashMap::new(),
        );

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, root.id);
        assert_eq!(tree[0].replies[0].comment.id, reply.id);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, nested.id);
        assert_eq!(tree[0].len(), 3);
        assert_eq!(tree[1].comment.id, other_root.id);
    }

    #[test]
    fn replies_are_oldest_first() {
        let post = EntityId::new();
        let root = at(post, None, 0);
        let late = at(post, Some(root.id), 10);
        let early = at(post, Some(root.id), 5);

        let tree = build_tree(vec![root, late.clone(), early.clone()], &HashMap::new());
        let ids: Vec<_> = tree[0].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[test]
    fn orphans_become_roots() {
        let post = EntityId::new();
        let orphan = at(post, Some(EntityId::new()), 0);

        let tree = build_tree(vec![orphan.clone()], &HashMap::new());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, orphan.id);
    }

    #[test]
    fn authors_are_attached() {
        let post = EntityId::new();
        let comment = at(post, None, 0);
        let author = User::new(comment.author_id).with_name("Ada");
        let authors = HashMap::from([(author.id, author.clone())]);

        let tree = build_tree(vec![comment], &authors);
        assert_eq!(tree[0].author, Some(author));
    }

    #[test]
    fn empty_input_is_empty_forest() {
        assert!(build_tree(Vec::new(), &HashMap::new()).is_empty());
    }
}
