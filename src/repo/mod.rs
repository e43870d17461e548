pub mod movies;
pub mod persons;
pub mod ratings;
pub mod reviews;
pub mod taxonomy;
pub mod tokens;

pub use movies::MovieRepo;
pub use persons::PersonRepo;
pub use ratings::RatingRepo;
pub use reviews::ReviewRepo;
pub use taxonomy::TaxonomyRepo;
pub use tokens::TokenRepo;
