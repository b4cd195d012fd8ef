use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::resource::{ColumnDef, ResourceTable};
use crate::domain::schema::FieldKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// Column catalog consumed by the composition core. `required` describes the
// create input: nullable columns and columns with a database default are
// optional.
impl ResourceTable for Entity {
    fn table() -> &'static str {
        "posts"
    }

    fn columns() -> &'static [ColumnDef] {
        &[
            ColumnDef {
                name: "id",
                kind: FieldKind::Integer,
                required: true,
                nullable: false,
            },
            ColumnDef {
                name: "user_id",
                kind: FieldKind::Integer,
                required: true,
                nullable: false,
            },
            ColumnDef {
                name: "title",
                kind: FieldKind::Text,
                required: true,
                nullable: false,
            },
            ColumnDef {
                name: "content",
                kind: FieldKind::Text,
                required: false,
                nullable: true,
            },
            ColumnDef {
                name: "published",
                kind: FieldKind::Boolean,
                required: false,
                nullable: false,
            },
            ColumnDef {
                name: "is_active",
                kind: FieldKind::Boolean,
                required: false,
                nullable: false,
            },
            ColumnDef {
                name: "created_at",
                kind: FieldKind::Text,
                required: true,
                nullable: false,
            },
            ColumnDef {
                name: "updated_at",
                kind: FieldKind::Text,
                required: true,
                nullable: false,
            },
        ]
    }
}
