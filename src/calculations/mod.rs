pub mod resolve;

pub use resolve::{DateResolver, ResolveError};
