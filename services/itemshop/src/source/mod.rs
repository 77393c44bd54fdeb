pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpCatalog;
pub use mock::MockCatalog;
pub use traits::CatalogSource;
