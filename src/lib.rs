pub mod config;
pub mod env;
pub mod errors;
pub mod gists;
pub mod github;
pub mod http;
pub mod revisions;
pub mod source;
pub mod testing;
pub mod view;

mod serde;

pub use gists::Gists;
pub use github::GistClient;

include!(concat!(env!("OUT_DIR"), "/", "version.rs"));

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
