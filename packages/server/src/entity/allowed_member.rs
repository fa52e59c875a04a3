use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sign-up allow list. Only emails present here may register; an optional role
/// override is copied onto the member at registration.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allowed_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    pub role: Option<String>,

    pub joined_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
