mod registry;
mod traits;

pub mod chan;
pub mod reddit;

pub use chan::ChanSource;
pub use reddit::{RedditError, RedditSource};
pub use registry::SourceRegistry;
pub use traits::Source;
