use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub spotify_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub token_expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::top_artists::Entity")]
    TopArtists,
    #[sea_orm(has_many = "super::top_tracks::Entity")]
    TopTracks,
    #[sea_orm(has_many = "super::listening_history::Entity")]
    ListeningHistory,
}

impl Related<super::top_artists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopArtists.def()
    }
}

impl Related<super::top_tracks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopTracks.def()
    }
}

impl Related<super::listening_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListeningHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
