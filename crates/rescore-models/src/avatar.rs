//! Avatar models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded avatar image used as the subject of motion generation.
///
/// Plain artifact row; avatars have no job lifecycle of their own.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Avatar {
    pub id: Uuid,

    pub storage_key: String,

    pub content_type: String,

    pub created_at: DateTime<Utc>,
}

impl Avatar {
    pub fn object_key(id: Uuid, extension: &str) -> String {
        format!("avatar_{id}.{extension}")
    }
}
