/// List service - curated collections of posts or followed accounts
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{follow_repo, list_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::check_list_ownership;
use crate::models::{List, ListKind, ListMembers};
use crate::response::{Page, PageRequest};
use crate::services::posts::PostService;
use crate::state::AppState;
use crate::validators::normalize_optional;

pub const MAX_LIST_NAME_CHARS: usize = 60;
pub const MAX_LIST_DESCRIPTION_CHARS: usize = 280;

#[derive(Debug, Default)]
pub struct ListChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub is_private: Option<bool>,
    /// Accepted only when it matches the current kind
    pub kind: Option<ListKind>,
}

pub struct ListService {
    state: AppState,
    pool: PgPool,
}

impl ListService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            pool: state.db.clone(),
        }
    }

    pub async fn my_lists(&self, user_id: Uuid, request: PageRequest) -> Result<Page<List>> {
        self.owner_lists(user_id, true, request).await
    }

    /// Public lists of a user; the owner also sees private ones.
    pub async fn user_lists(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<List>> {
        if !user_repo::exists_active(&self.pool, user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.owner_lists(user_id, viewer == Some(user_id), request)
            .await
    }

    pub async fn create_list(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
        kind: ListKind,
        is_private: bool,
    ) -> Result<List> {
        let name = validate_name(name)?;
        let description = validate_description(normalize_optional(description))?;

        let list_id = list_repo::create_list(
            &self.pool,
            owner_id,
            name,
            description.as_deref(),
            kind,
            is_private,
        )
        .await
        .map_err(duplicate_name)?;

        tracing::info!(%owner_id, %list_id, %kind, "list created");
        self.load(list_id).await
    }

    pub async fn get_list(&self, viewer: Option<Uuid>, list_id: Uuid) -> Result<List> {
        let list = self.load(list_id).await?;
        if list.is_visible_to(viewer) {
            Ok(list)
        } else {
            Err(list_not_found())
        }
    }

    pub async fn update_list(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        changes: ListChanges,
    ) -> Result<List> {
        let list = self.owned_list(user_id, list_id).await?;
        if changes.kind.is_some_and(|kind| kind != list.kind) {
            return Err(AppError::BadRequest(
                "List kind cannot be changed".to_string(),
            ));
        }

        let name = changes.name.as_deref().map(validate_name).transpose()?;
        let description = match changes.description {
            Some(description) => Some(validate_description(normalize_optional(
                description.as_deref(),
            ))?),
            None => None,
        };

        list_repo::update_list(
            &self.pool,
            list.id,
            name,
            description.as_ref().map(|d| d.as_deref()),
            changes.is_private,
        )
        .await
        .map_err(duplicate_name)?;

        self.load(list_id).await
    }

    pub async fn delete_list(&self, user_id: Uuid, list_id: Uuid) -> Result<()> {
        let list = self.owned_list(user_id, list_id).await?;
        list_repo::delete_list(&self.pool, list.id).await?;
        tracing::info!(%user_id, %list_id, "list deleted");
        Ok(())
    }

    pub async fn members(
        &self,
        viewer: Option<Uuid>,
        list_id: Uuid,
        request: PageRequest,
    ) -> Result<ListMembers> {
        let list = self.get_list(viewer, list_id).await?;

        match list.kind {
            ListKind::Posts => {
                let (rows, total) = post_repo::list_in_list(
                    &self.pool,
                    viewer,
                    list.id,
                    request.limit(),
                    request.offset(),
                )
                .await?;
                let page = PostService::new(&self.state)
                    .hydrate_page(rows, request, total)
                    .await?;
                Ok(ListMembers::Posts(page))
            }
            ListKind::Users => {
                let (users, total) = list_repo::list_user_members(
                    &self.pool,
                    viewer,
                    list.id,
                    request.limit(),
                    request.offset(),
                )
                .await?;
                Ok(ListMembers::Users(Page::new(users, request, total)))
            }
        }
    }

    /// Idempotent. "posts" lists take posts the owner can see; "users"
    /// lists take accounts the owner follows.
    pub async fn add_member(&self, user_id: Uuid, list_id: Uuid, member_id: Uuid) -> Result<List> {
        let list = self.owned_list(user_id, list_id).await?;

        match list.kind {
            ListKind::Posts => {
                post_repo::find_visible_owner(&self.pool, Some(user_id), member_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
                list_repo::add_post(&self.pool, list.id, member_id).await?;
            }
            ListKind::Users => {
                if !user_repo::exists_active(&self.pool, member_id).await? {
                    return Err(AppError::NotFound("User not found".to_string()));
                }
                if !follow_repo::is_following(&self.pool, user_id, member_id).await? {
                    return Err(AppError::BadRequest(
                        "You can only add accounts you follow to this list".to_string(),
                    ));
                }
                list_repo::add_user(&self.pool, list.id, member_id).await?;
            }
        }

        list_repo::touch(&self.pool, list.id).await?;
        self.load(list_id).await
    }

    /// Idempotent.
    pub async fn remove_member(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        member_id: Uuid,
    ) -> Result<List> {
        let list = self.owned_list(user_id, list_id).await?;
        if list_repo::remove_member(&self.pool, list.id, list.kind, member_id).await? {
            list_repo::touch(&self.pool, list.id).await?;
        }
        self.load(list_id).await
    }

    async fn owner_lists(
        &self,
        owner_id: Uuid,
        include_private: bool,
        request: PageRequest,
    ) -> Result<Page<List>> {
        let (rows, total) = list_repo::list_by_owner(
            &self.pool,
            owner_id,
            include_private,
            request.limit(),
            request.offset(),
        )
        .await?;

        let lists = rows
            .into_iter()
            .map(List::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::Internal)?;
        Ok(Page::new(lists, request, total))
    }

    /// Private lists of other users are indistinguishable from missing ones.
    async fn owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<List> {
        let list = self.get_list(Some(user_id), list_id).await?;
        check_list_ownership(user_id, &list)?;
        Ok(list)
    }

    async fn load(&self, list_id: Uuid) -> Result<List> {
        let row = list_repo::find_list(&self.pool, list_id)
            .await?
            .ok_or_else(list_not_found)?;
        List::try_from(row).map_err(AppError::Internal)
    }
}

fn list_not_found() -> AppError {
    AppError::NotFound("List not found".to_string())
}

fn duplicate_name(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => {
            AppError::Conflict("You already have a list with that name".to_string())
        }
        other => other,
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_LIST_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "List name must be 1-{MAX_LIST_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

fn validate_description(description: Option<String>) -> Result<Option<String>> {
    match description {
        Some(d) if d.chars().count() > MAX_LIST_DESCRIPTION_CHARS => Err(AppError::Validation(
            format!("List description must be at most {MAX_LIST_DESCRIPTION_CHARS} characters"),
        )),
        other => Ok(other),
    }
}
