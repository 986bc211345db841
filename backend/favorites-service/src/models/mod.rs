pub mod favorites;
pub mod movie;
pub mod user;

pub use favorites::{AddFavoriteRequest, FavoritesView};
pub use movie::{CachedMovie, Genre, MovieDetails, MovieSearchResults, MovieSummary};
pub use user::{LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest, User, STATUS_ACTIVE};
