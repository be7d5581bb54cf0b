use super::{
    auth::MarketplaceHasher, AuthToken, AuthTokenValue, NewUser, User, UserAuthCredentials,
    UserAuthCredentialsStore, UserAuthTokenStore, UserStore, UsernamePasswordCredentials,
};
use anyhow::{bail, Context, Result};
use std::time::SystemTime;
use tracing::{debug, info};
use uuid::Uuid;

pub struct UserManager {
    user_store: Box<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>) -> Self {
        Self { user_store }
    }

    /// Registers a new user and returns its generated id.
    pub fn add_user(&self, new_user: NewUser) -> Result<String> {
        let email = new_user.email.trim().to_string();
        if email.is_empty() {
            bail!("The user email cannot be empty.")
        }
        if !email.contains('@') {
            bail!("{} is not a valid email address.", email)
        }
        if self.user_store.get_user_id(&email)?.is_some() {
            bail!("User with email {} already exists.", email);
        }

        let user_id = Uuid::new_v4().to_string();
        let new_user = NewUser { email, ..new_user };
        self.user_store.create_user(&user_id, &new_user)?;
        info!("Created user {} with id {}", new_user.email, user_id);
        Ok(user_id)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.user_store.get_user(user_id)
    }

    pub fn get_user_id(&self, email: &str) -> Result<Option<String>> {
        self.user_store.get_user_id(email)
    }

    pub fn get_all_user_emails(&self) -> Result<Vec<String>> {
        self.user_store.get_all_user_emails()
    }

    fn create_hashed_password(user_id: &str, password: &str) -> Result<UsernamePasswordCredentials> {
        if password.is_empty() {
            bail!("The password cannot be empty.");
        }
        let hasher = MarketplaceHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(UsernamePasswordCredentials {
            user_id: user_id.to_string(),
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_tried: None,
            last_used: None,
        })
    }

    fn require_credentials(&self, email: &str) -> Result<UserAuthCredentials> {
        self.user_store
            .get_user_auth_credentials(email)?
            .with_context(|| format!("User with email {} not found.", email))
    }

    pub fn create_password_credentials(&self, email: &str, password: &str) -> Result<()> {
        let mut credentials = self.require_credentials(email)?;
        if credentials.username_password.is_some() {
            bail!(
                "User with email {} already has password credentials. Maybe you want to update them?",
                email
            );
        }
        credentials.username_password =
            Some(Self::create_hashed_password(&credentials.user_id, password)?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn update_password_credentials(&self, email: &str, password: &str) -> Result<()> {
        let mut credentials = self.require_credentials(email)?;
        if credentials.username_password.is_none() {
            bail!(
                "Cannot update password of user with email {} since it never had one.",
                email
            );
        }
        credentials.username_password =
            Some(Self::create_hashed_password(&credentials.user_id, password)?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn delete_password_credentials(&self, email: &str) -> Result<()> {
        let mut credentials = self.require_credentials(email)?;
        credentials.username_password = None;
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn get_user_credentials(&self, email: &str) -> Result<Option<UserAuthCredentials>> {
        self.user_store.get_user_auth_credentials(email)
    }

    /// Checks `password` against the stored credentials of `email`.
    /// Returns the user id on success, None for unknown users, users
    /// without a password and wrong passwords alike.
    pub fn verify_password(&self, email: &str, password: &str) -> Result<Option<String>> {
        let Some(credentials) = self.user_store.get_user_auth_credentials(email)? else {
            debug!("No user with email {}", email);
            return Ok(None);
        };
        let Some(password_credentials) = credentials.username_password else {
            debug!("User {} has no password credentials", email);
            return Ok(None);
        };
        let verified = password_credentials.verify(password)?;
        self.user_store
            .touch_password_credentials(&credentials.user_id, verified)?;
        Ok(verified.then_some(credentials.user_id))
    }

    pub fn generate_auth_token(&self, user_id: &str) -> Result<AuthToken> {
        let token = AuthToken {
            user_id: user_id.to_string(),
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    /// Deletes a token, which must belong to `user_id`.
    pub fn delete_auth_token(&self, user_id: &str, token_value: &AuthTokenValue) -> Result<()> {
        match self.user_store.get_user_auth_token(token_value)? {
            Some(token) if token.user_id == user_id => {
                self.user_store.delete_user_auth_token(token_value)?;
                Ok(())
            }
            Some(token) => bail!(
                "Tried to delete auth token of user {}, but the authenticated user was {}.",
                token.user_id,
                user_id
            ),
            None => bail!("Did not find auth token."),
        }
    }

    pub fn get_user_tokens(&self, email: &str) -> Result<Vec<AuthToken>> {
        self.user_store.get_all_user_auth_tokens(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace_db::open_temp_db;
    use crate::user::SqliteUserStore;

    fn create_tmp_manager() -> (UserManager, tempfile::TempDir) {
        let (conn, dir) = open_temp_db();
        (UserManager::new(Box::new(SqliteUserStore::new(conn))), dir)
    }

    #[test]
    fn adds_users_with_unique_emails() {
        let (manager, _dir) = create_tmp_manager();

        let user_id = manager
            .add_user(NewUser {
                email: " ada@example.com ".to_string(),
                first_name: Some("Ada".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(Uuid::parse_str(&user_id).is_ok());

        let user = manager.get_user(&user_id).unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name.as_deref(), Some("Ada"));

        assert!(manager
            .add_user(NewUser::with_email("ada@example.com"))
            .is_err());
        assert!(manager.add_user(NewUser::with_email("")).is_err());
        assert!(manager.add_user(NewUser::with_email("not-an-email")).is_err());
    }

    #[test]
    fn verifies_passwords() {
        let (manager, _dir) = create_tmp_manager();
        let user_id = manager
            .add_user(NewUser::with_email("ada@example.com"))
            .unwrap();

        assert_eq!(manager.verify_password("ada@example.com", "pw").unwrap(), None);

        manager
            .create_password_credentials("ada@example.com", "pw")
            .unwrap();
        assert!(manager
            .create_password_credentials("ada@example.com", "again")
            .is_err());

        assert_eq!(
            manager.verify_password("ada@example.com", "pw").unwrap(),
            Some(user_id.clone())
        );
        assert_eq!(manager.verify_password("ada@example.com", "nope").unwrap(), None);
        assert_eq!(manager.verify_password("bob@example.com", "pw").unwrap(), None);

        manager
            .update_password_credentials("ada@example.com", "new-pw")
            .unwrap();
        assert_eq!(manager.verify_password("ada@example.com", "pw").unwrap(), None);
        assert_eq!(
            manager.verify_password("ada@example.com", "new-pw").unwrap(),
            Some(user_id)
        );

        manager.delete_password_credentials("ada@example.com").unwrap();
        assert_eq!(
            manager.verify_password("ada@example.com", "new-pw").unwrap(),
            None
        );
        assert!(manager
            .update_password_credentials("ada@example.com", "x")
            .is_err());
    }

    #[test]
    fn only_owner_can_delete_token() {
        let (manager, _dir) = create_tmp_manager();
        let ada = manager.add_user(NewUser::with_email("ada@example.com")).unwrap();
        let bob = manager.add_user(NewUser::with_email("bob@example.com")).unwrap();

        let token = manager.generate_auth_token(&ada).unwrap();
        assert!(manager.delete_auth_token(&bob, &token.value).is_err());
        assert!(manager.get_auth_token(&token.value).unwrap().is_some());

        manager.delete_auth_token(&ada, &token.value).unwrap();
        assert!(manager.get_auth_token(&token.value).unwrap().is_none());
        assert!(manager.delete_auth_token(&ada, &token.value).is_err());
    }
}
