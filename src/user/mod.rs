pub mod auth;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::{
    AuthToken, AuthTokenValue, MarketplaceHasher, UserAuthCredentials, UsernamePasswordCredentials,
};
pub use sqlite_user_store::{
    SqliteUserStore, AUTH_TOKEN_TABLE_V_0, USER_PASSWORD_CREDENTIALS_V_0, USER_TABLE_V_0,
};
pub use user_manager::UserManager;
pub use user_models::{NewUser, User};
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
