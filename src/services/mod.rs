// Service exports
pub mod source;
pub mod static_source;
pub mod table_store;

pub use source::{FetchScope, HotspotSource, SourceError, SourceLayout};
pub use static_source::StaticSource;
pub use table_store::{default_table_name, TableStoreClient};
