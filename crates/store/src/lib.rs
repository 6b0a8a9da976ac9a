pub mod collection;
pub mod db;
pub mod error;
pub mod ident;
pub mod schema;
pub mod stats;

pub use collection::{Collection, GeneratedId, Record};
pub use db::GlyphDb;
pub use error::{Result, StoreError};
pub use schema::{DreamSeed, GenericGlyph, NewDream, NewGlyph, UserProfile};
