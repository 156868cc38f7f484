pub mod error;
pub mod graphql;
pub mod ports;
pub mod testing;

pub use error::{HubError, HubErrorKind};
pub use graphql::{GraphQLHubClient, HubConfig};
pub use ports::HubClient;
pub use testing::InMemoryHubClient;
