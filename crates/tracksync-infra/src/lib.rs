//! Infrastructure layer for tracksync.
//!
//! Contains implementations of the port traits defined in `tracksync-core`:
//! the GraphQL remote tracker store client and the regex text anonymizer,
//! plus loaders for the TOML configuration and the YAML domain file.

pub mod anonymizer;
pub mod config;
pub mod domain;
pub mod graphql;

pub use anonymizer::RegexAnonymizer;
pub use graphql::GraphqlRemoteClient;
