use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::post::Post;
use super::user::{UserCard, UserSummary};
use crate::response::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Posts,
    Users,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Posts => "posts",
            ListKind::Users => "users",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(ListKind::Posts),
            "users" => Ok(ListKind::Users),
            other => Err(format!("unknown list kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ListRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_display_name: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub is_private: bool,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct List {
    pub id: Uuid,
    pub owner: UserSummary,
    pub name: String,
    pub description: Option<String>,
    pub kind: ListKind,
    pub is_private: bool,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        !self.is_private || viewer == Some(self.owner.id)
    }
}

impl TryFrom<ListRow> for List {
    type Error = String;

    fn try_from(row: ListRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner: UserSummary {
                id: row.owner_id,
                username: row.owner_username,
                display_name: row.owner_display_name,
                avatar_url: row.owner_avatar_url,
            },
            name: row.name,
            description: row.description,
            kind: row.kind.parse()?,
            is_private: row.is_private,
            member_count: row.member_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Members of a list, shaped by its kind. Serialized as the page with a
/// `kind` tag next to the items.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ListMembers {
    Posts(Page<Post>),
    Users(Page<UserCard>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, is_private: bool) -> ListRow {
        ListRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_username: "ada".into(),
            owner_display_name: None,
            owner_avatar_url: None,
            name: "Reading".into(),
            description: None,
            kind: kind.into(),
            is_private,
            member_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn kind_round_trips_through_text() {
        assert_eq!("posts".parse::<ListKind>(), Ok(ListKind::Posts));
        assert_eq!(ListKind::Users.to_string(), "users");
        assert!("people".parse::<ListKind>().is_err());
    }

    #[test]
    fn members_are_tagged_with_the_list_kind() {
        let page = Page::new(Vec::<Post>::new(), Default::default(), 0);
        let value = serde_json::to_value(ListMembers::Posts(page)).unwrap();
        assert_eq!(value["kind"], "posts");
        assert_eq!(value["total"], 0);
        assert!(value["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(List::try_from(row("people", false)).is_err());
    }

    #[test]
    fn private_lists_are_owner_only() {
        let list = List::try_from(row("users", true)).unwrap();
        assert!(list.is_visible_to(Some(list.owner.id)));
        assert!(!list.is_visible_to(Some(Uuid::new_v4())));
        assert!(!list.is_visible_to(None));

        let public = List::try_from(row("posts", false)).unwrap();
        assert!(public.is_visible_to(None));
    }
}
