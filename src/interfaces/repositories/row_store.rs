use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::StoreError;

/// Tables of the hosted row store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Projects,
    BlogPosts,
    Certificates,
    Hackathons,
    CodingProfiles,
    ProfileSettings,
    ContactMessages,
    Users,
    UserRoles,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Projects,
        Table::BlogPosts,
        Table::Certificates,
        Table::Hackathons,
        Table::CodingProfiles,
        Table::ProfileSettings,
        Table::ContactMessages,
        Table::Users,
        Table::UserRoles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Projects => "projects",
            Table::BlogPosts => "blog_posts",
            Table::Certificates => "certificates",
            Table::Hackathons => "hackathons",
            Table::CodingProfiles => "coding_profiles",
            Table::ProfileSettings => "profile_settings",
            Table::ContactMessages => "contact_messages",
            Table::Users => "users",
            Table::UserRoles => "user_roles",
        }
    }

    /// Column whitelist; nothing else ever reaches generated SQL.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Projects => &[
                "id", "title", "description", "image", "date", "category", "technologies",
                "featured", "demourl", "githuburl", "submissions",
            ],
            Table::BlogPosts => &[
                "id", "title", "slug", "description", "content", "coverimage", "date", "readtime", "tags",
            ],
            Table::Certificates => &["id", "title", "issuer", "date", "credentialurl", "image", "description"],
            Table::Hackathons => &["id", "name", "date", "role", "result", "learnings", "image"],
            Table::CodingProfiles => &[
                "id", "github_username", "show_github", "leetcode_username", "show_leetcode",
                "hackerrank_username", "show_hackerrank", "hackerrank_badges",
            ],
            Table::ProfileSettings => &[
                "id", "name", "title", "description", "resumeurl", "githuburl", "linkedinurl",
                "twitterurl", "email", "contactendpoint",
            ],
            Table::ContactMessages => &["id", "name", "email", "subject", "message", "created_at"],
            Table::Users => &["id", "email", "password_hash", "created_at"],
            Table::UserRoles => &["user_id", "role"],
        }
    }

    /// Column identifying a row for update, upsert and delete.
    pub fn key_column(&self) -> &'static str {
        match self {
            Table::UserRoles => "user_id",
            _ => "id",
        }
    }

    /// Column the public pages sort by, newest first.
    pub fn date_column(&self) -> Option<&'static str> {
        match self {
            Table::Projects | Table::BlogPosts | Table::Certificates | Table::Hackathons => Some("date"),
            Table::ContactMessages | Table::Users => Some("created_at"),
            _ => None,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    pub fn check_column(&self, column: &str) -> Result<(), StoreError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!("unknown column {}.{}", self.name(), column)))
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| StoreError::Rejected(format!("unknown table {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals the value.
    Eq { column: String, value: Value },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Query { table, filters: Vec::new(), order: None, limit: None }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq { column: column.to_string(), value: value.into() });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order { column: column.to_string(), descending: true });
        self
    }

    /// Newest first when the table has a date column.
    pub fn newest_first(self) -> Self {
        match self.table.date_column() {
            Some(column) => self.order_desc(column),
            None => self,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn check(&self) -> Result<(), StoreError> {
        for filter in &self.filters {
            self.table.check_column(filter.column())?;
        }
        if let Some(order) = &self.order {
            self.table.check_column(&order.column)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// One batch call for any number of rows.
    Insert(Vec<Value>),
    Update { id: Uuid, changes: Value },
    Upsert(Value),
    Delete { id: Uuid },
}

impl Mutation {
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Insert(_) => "insert",
            Mutation::Update { .. } => "update",
            Mutation::Upsert(_) => "upsert",
            Mutation::Delete { .. } => "delete",
        }
    }
}

/// Checks that every key of a row object is a known column.
pub fn check_row(table: Table, row: &Value) -> Result<(), StoreError> {
    let object = row
        .as_object()
        .ok_or_else(|| StoreError::Rejected(format!("{} row must be an object", table)))?;
    for column in object.keys() {
        table.check_column(column)?;
    }
    Ok(())
}

#[async_trait]
pub trait RowStore: Send + Sync {
    async fn query(&self, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Returns the affected rows. `Update` and `Delete` report `NotFound` when
    /// no row has the id.
    async fn mutate(&self, table: Table, mutation: Mutation) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<i64, StoreError>;

    /// Server-side role predicate.
    async fn is_admin(&self, user_id: Uuid) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_rejects_unknown_columns() {
        let query = Query::table(Table::Projects).eq("title; DROP TABLE projects", "x");
        assert!(matches!(query.check(), Err(StoreError::Rejected(_))));

        let ok = Query::table(Table::BlogPosts).eq("slug", "hello-world").newest_first().limit(3);
        assert!(ok.check().is_ok());
        assert_eq!(ok.order.unwrap().column, "date");
    }

    #[test]
    fn table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(table.name().parse::<Table>().unwrap(), table);
        }
        assert!("secrets".parse::<Table>().is_err());
    }

    #[test]
    fn check_row_validates_keys() {
        assert!(check_row(Table::Hackathons, &json!({"id": Uuid::nil(), "name": "HackDay"})).is_ok());
        assert!(check_row(Table::Hackathons, &json!({"nickname": "x"})).is_err());
        assert!(check_row(Table::Hackathons, &json!([1, 2])).is_err());
    }
}
