// urlview library exports

pub mod document;
pub mod host;
pub mod syntax;

pub use document::Buffer;
pub use host::TerminalHost;
pub use syntax::{ScopeMap, ScopeResolver};
