//! Configuration module

mod site;

pub use site::ContentApiConfig;
pub use site::ListingConfig;
pub use site::SiteConfig;
