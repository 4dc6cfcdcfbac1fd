pub mod db;
pub mod unsplash;

pub use db::DbAdapter;
pub use unsplash::{DisabledImageSearch, UnsplashAdapter};
