pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::UserId;
pub use error::{Result, UserStoreError};
pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use record::{UserFields, UserRecord};
pub use store::UserStore;
