use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "top_artists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Uuid,
    pub spotify_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub genres: Json,
    pub popularity: i32,
    pub time_range: String,
    pub rank: i32,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Genres as stored by the provider, decoded from the JSON column.
    pub fn genre_list(&self) -> Vec<String> {
        serde_json::from_value(self.genres.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
