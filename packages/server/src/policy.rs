//! Authorization policy evaluator.
//!
//! Every ownership/role decision in the API goes through [`authorize`],
//! which takes the requesting principal and a declarative [`Action`]
//! carrying the ownership facts the decision needs. Handlers fetch the
//! target entity first (missing entities are 404 before any policy
//! check), then ask the evaluator, then perform the mutation. This keeps
//! not-found, forbidden, and referential-mismatch outcomes
//! distinguishable to callers.

use uuid::Uuid;

use crate::entity::{comment, user};
use crate::error::AppError;

/// An authenticated user, reduced to the fields policy decisions need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub is_active: bool,
    pub is_superuser: bool,
}

/// The actor making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Known(Actor),
}

impl From<&user::Model> for Principal {
    fn from(user: &user::Model) -> Self {
        Principal::Known(Actor {
            id: user.id,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
        })
    }
}

/// A requested operation, tagged with the ownership facts it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Public reads: blog posts, tags, a post's comments.
    ReadPublic,
    /// Create/update/delete blog posts.
    ManageBlogPosts,
    /// Create/update/delete tags.
    ManageTags,
    /// Upload, list, and delete images.
    ManageImages,
    CreateComment,
    UpdateComment { author_id: Option<Uuid> },
    DeleteComment { author_id: Option<Uuid> },
    /// Admin listing of every comment.
    ListAllComments,
    /// Listing of one user's comments.
    ListUserComments { owner_id: Uuid },
    ListUsers,
    ReadUser { target_id: Uuid },
    /// Admin user creation.
    CreateUser,
    /// Update own profile.
    UpdateSelf,
    /// Admin update of any user. `clears_superuser` is set when the
    /// payload would turn the superuser flag off.
    UpdateUser { target_id: Uuid, clears_superuser: bool },
    /// Delete own account.
    DeleteSelf,
    /// Admin deletion of any user.
    DeleteUser { target_id: Uuid },
}

const NO_ADMIN: &str = "The user does not have admin privileges";

/// Decide whether `principal` may perform `action`.
///
/// Returns `Ok(())` on permit; denials carry the reason. The caller is
/// responsible for having resolved the target entity already, so a
/// denial here always means "resource exists, rights missing" (or a
/// missing/invalid credential for anonymous callers).
pub fn authorize(principal: &Principal, action: &Action) -> Result<(), AppError> {
    if matches!(action, Action::ReadPublic) {
        return Ok(());
    }

    let actor = match principal {
        Principal::Known(actor) => actor,
        Principal::Anonymous => return Err(AppError::TokenMissing),
    };

    if !actor.is_active {
        return Err(AppError::Forbidden("Inactive user".into()));
    }

    match *action {
        Action::ReadPublic => Ok(()),

        Action::ManageBlogPosts
        | Action::ManageTags
        | Action::ManageImages
        | Action::ListAllComments
        | Action::ListUsers
        | Action::CreateUser => require_superuser(actor),

        Action::CreateComment | Action::UpdateSelf => Ok(()),

        Action::UpdateComment { author_id } => {
            if author_id == Some(actor.id) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No permission to update this comment".into(),
                ))
            }
        }

        Action::DeleteComment { author_id } => {
            if author_id == Some(actor.id) || actor.is_superuser {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No permission to delete this comment".into(),
                ))
            }
        }

        Action::ListUserComments { owner_id } => {
            if owner_id == actor.id || actor.is_superuser {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No permission to view this user's comments".into(),
                ))
            }
        }

        Action::ReadUser { target_id } => {
            if target_id == actor.id || actor.is_superuser {
                Ok(())
            } else {
                Err(AppError::Forbidden(NO_ADMIN.into()))
            }
        }

        Action::UpdateUser {
            target_id,
            clears_superuser,
        } => {
            require_superuser(actor)?;
            if clears_superuser && target_id == actor.id {
                Err(AppError::Forbidden(
                    "Superusers cannot demote themselves".into(),
                ))
            } else {
                Ok(())
            }
        }

        Action::DeleteSelf => {
            if actor.is_superuser {
                Err(AppError::Forbidden(
                    "Superusers are not allowed to delete themselves".into(),
                ))
            } else {
                Ok(())
            }
        }

        Action::DeleteUser { target_id } => {
            require_superuser(actor)?;
            if target_id == actor.id {
                Err(AppError::Forbidden(
                    "Superusers are not allowed to delete themselves".into(),
                ))
            } else {
                Ok(())
            }
        }
    }
}

fn require_superuser(actor: &Actor) -> Result<(), AppError> {
    if actor.is_superuser {
        Ok(())
    } else {
        Err(AppError::Forbidden(NO_ADMIN.into()))
    }
}

/// Referential check for comment operations scoped to a blog post.
pub fn ensure_comment_on_post(target: &comment::Model, blog_post_id: i32) -> Result<(), AppError> {
    if target.blog_post_id == blog_post_id {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Comment does not belong to this blog post".into(),
        ))
    }
}

/// Referential check for threaded replies: the parent must be a comment
/// on the same blog post.
pub fn ensure_reply_target(parent: &comment::Model, blog_post_id: i32) -> Result<(), AppError> {
    if parent.blog_post_id == blog_post_id {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Reply target is not a comment on this blog post".into(),
        ))
    }
}
