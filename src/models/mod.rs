mod link;

pub use link::{CreateLinkRequest, CreatedLink, Link, RequestedCode};
