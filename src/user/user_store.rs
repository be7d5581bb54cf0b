use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use super::user_models::{NewUser, User};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user email.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_credentials(&self, email: &str) -> Result<Option<UserAuthCredentials>>;

    /// Replaces the user's authentication credentials.
    /// A `None` password removes the stored password credentials.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;

    /// Records a password attempt, successful or not.
    fn touch_password_credentials(&self, user_id: &str, success: bool) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns a user's authentication token given an AuthTokenValue.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    /// Returns Err if the token already exists.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;

    /// Returns all the authentication tokens of the user with the given email.
    fn get_all_user_auth_tokens(&self, email: &str) -> Result<Vec<AuthToken>>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user with the given id.
    /// Returns Err if the email is already taken.
    fn create_user(&self, user_id: &str, user: &NewUser) -> Result<()>;

    /// Returns the full user profile.
    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Returns a user's id given the email.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, email: &str) -> Result<Option<String>>;

    /// Returns all users' emails.
    fn get_all_user_emails(&self) -> Result<Vec<String>>;
}
