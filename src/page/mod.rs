//! Page acquisition: fetching raw HTML and parsing it into [`PageData`].
//!
//! [`PageData`]: crate::models::PageData

mod fetcher;
mod parser;

pub use fetcher::{fetch_url, FetchConfig, FetchError, FetchedPage};
pub use parser::{parse_html, ParseLimits};
