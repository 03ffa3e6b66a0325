use std::sync::Arc;

use validator::{ValidateEmail, ValidationError, ValidationErrors};

use crate::crypto::{PasswordManager, generate_token};
use crate::error::{Result, ServerError};
use crate::user::{
    Caller, MAX_FIELD_LENGTH, MIN_PASSWORD_LENGTH, NewUser, User, UserStore,
    normalize_email,
};

/// Fields a user may change on its own profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// User manager.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    pwd: Arc<PasswordManager>,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(store: Arc<dyn UserStore>, pwd: Arc<PasswordManager>) -> Self {
        Self { store, pwd }
    }

    /// Register a regular user.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, name);
        self.create(errors, email, password, name.trim(), false).await
    }

    /// Register a user with staff and superuser rights.
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let user = self
            .create(ValidationErrors::new(), email, password, "", true)
            .await?;
        tracing::info!(user_id = user.id, "superuser created");
        Ok(user)
    }

    async fn create(
        &self,
        mut errors: ValidationErrors,
        email: &str,
        password: &str,
        name: &str,
        superuser: bool,
    ) -> Result<User> {
        let email = normalize_email(email);
        if email.is_empty() {
            add(&mut errors, "email", "required", "This field may not be blank.");
        } else if email.chars().count() > MAX_FIELD_LENGTH
            || !email.validate_email()
        {
            add(&mut errors, "email", "email", "Enter a valid email address.");
        }
        check_password(&mut errors, password);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(crate::user::email_taken());
        }

        let user = self
            .store
            .insert(NewUser {
                email,
                name: name.to_owned(),
                password: self.pwd.hash_password(password)?,
                is_staff: superuser,
                is_superuser: superuser,
            })
            .await?;

        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Check credentials and issue a new bearer token.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String> {
        let email = normalize_email(email);

        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(ServerError::InvalidCredentials);
        };
        if !user.is_active || !self.pwd.verify_password(password, &user.password)
        {
            return Err(ServerError::InvalidCredentials);
        }

        let token = generate_token();
        self.store.insert_token(&token, user.id).await?;

        Ok(token)
    }

    /// Resolve a bearer token into a [`Caller`].
    pub async fn resolve(&self, token: &str) -> Result<Caller> {
        match self.store.find_by_token(token).await? {
            Some(user) if user.is_active => Ok(Caller { user_id: user.id }),
            _ => Err(ServerError::Unauthorized),
        }
    }

    /// Get the user behind `caller`.
    pub async fn get_profile(&self, caller: &Caller) -> Result<User> {
        self.store
            .find_by_id(caller.user_id)
            .await?
            .ok_or(ServerError::Unauthorized)
    }

    /// Partially update `name` and `password` of `caller`.
    pub async fn update_profile(
        &self,
        caller: &Caller,
        update: ProfileUpdate,
    ) -> Result<User> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &update.name {
            check_name(&mut errors, name);
        }
        if let Some(password) = &update.password {
            check_password(&mut errors, password);
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let mut user = self.get_profile(caller).await?;
        if let Some(name) = update.name {
            user.name = name.trim().to_owned();
        }
        if let Some(password) = update.password {
            user.password = self.pwd.hash_password(password)?;
        }

        self.store.update(&user).await?;
        Ok(user)
    }
}

fn add(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: &'static str,
) {
    errors.add(field, ValidationError::new(code).with_message(message.into()));
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        add(
            errors,
            "password",
            "length",
            "Ensure this field has at least 5 characters.",
        );
    }
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        add(errors, "name", "required", "This field may not be blank.");
    } else if name.chars().count() > MAX_FIELD_LENGTH {
        add(
            errors,
            "name",
            "length",
            "Ensure this field has no more than 255 characters.",
        );
    }
}
