mod catalog_source;

pub use catalog_source::{http_client, CatalogSource, USER_AGENT};
