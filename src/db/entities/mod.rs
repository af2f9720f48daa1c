pub mod users;
pub mod top_artists;
pub mod top_tracks;
pub mod listening_history;

pub use users::Entity as Users;
pub use top_artists::Entity as TopArtists;
pub use top_tracks::Entity as TopTracks;
pub use listening_history::Entity as ListeningHistory;
