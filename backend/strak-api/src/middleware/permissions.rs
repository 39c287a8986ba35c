/// Ownership checks for mutating endpoints.
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CommentOwnership, List, PostOwner};

pub fn check_post_ownership(user_id: Uuid, post: &PostOwner, action: &str) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You don't have permission to {action} this post"
        )))
    }
}

/// Only the comment's author may edit it.
pub fn check_comment_edit(user_id: Uuid, comment: &CommentOwnership) -> Result<()> {
    if comment.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to edit this comment".to_string(),
        ))
    }
}

/// The comment's author or the author of the post it sits on may delete it.
pub fn check_comment_deletion(user_id: Uuid, comment: &CommentOwnership) -> Result<()> {
    if comment.author_id == user_id || comment.post_author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to delete this comment".to_string(),
        ))
    }
}

pub fn check_list_ownership(user_id: Uuid, list: &List) -> Result<()> {
    if list.owner.id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this list".to_string(),
        ))
    }
}
