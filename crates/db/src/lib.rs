pub mod fixtures;
pub mod repositories;
pub mod session;
pub mod store;

pub use fixtures::SeedDataset;
pub use repositories::RepositoryError;
pub use session::ViewStore;
pub use store::AppStore;
