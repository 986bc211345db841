pub mod catalog;
pub mod favorites;
pub mod movie_cache;
pub mod users;

pub use catalog::{MovieCatalog, TmdbClient};
pub use favorites::FavoritesService;
pub use movie_cache::MovieCache;
pub use users::UserService;
