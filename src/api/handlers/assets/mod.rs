pub mod list;
pub mod manage;
pub mod serve;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use list::list_assets;
pub use manage::delete_asset;
pub use serve::serve_asset;
pub use upload::upload_asset;
