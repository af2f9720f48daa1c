pub mod analytics;
pub mod spotify;
pub mod sync;
pub mod token;
pub mod users;

pub use analytics::{AnalyticsService, DashboardStats, Discovery, GenreShare};
pub use spotify::{
    RecentlyPlayedItem, SpotifyArtist, SpotifyClient, SpotifyImage, SpotifyProfile, SpotifyTrack,
    TokenResponse,
};
pub use sync::{PlaylistExport, SyncService};
pub use token::TokenManager;
pub use users::{UserService, UserStats};
