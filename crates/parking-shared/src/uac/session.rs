use secrecy::{ExposeSecret as _, SecretString};

use crate::{id::AccountId, time::Timestamp, token::AccessClaims};

use super::{Account, Login, Role};

/// The client held record of the authenticated user and their tokens
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: AccountId,
    pub login: Login,
    pub roles: Vec<Role>,
    pub active_role: Role,
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: Timestamp,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("the account has no active roles")]
    NoRoles,
    #[error("the role {0} is not assigned to this account")]
    RoleNotAssigned(Role),
    #[error("token was issued for '{token_subject}' but the account is '{account_login}'")]
    SubjectMismatch {
        token_subject: String,
        account_login: String,
    },
}

impl Session {
    /// Builds a session from a freshly fetched account and its tokens
    ///
    /// `preferred_role` is used as the active role if it is still assigned,
    /// otherwise the first role the server lists is used
    pub fn new(
        account: &Account,
        access_token: SecretString,
        refresh_token: SecretString,
        claims: &AccessClaims,
        preferred_role: Option<Role>,
    ) -> Result<Self, SessionError> {
        if claims.sub != account.login.as_ref() {
            return Err(SessionError::SubjectMismatch {
                token_subject: claims.sub.clone(),
                account_login: account.login.to_string(),
            });
        }
        let roles = account.roles();
        let active_role = pick_active_role(&roles, preferred_role).ok_or(SessionError::NoRoles)?;
        Ok(Self {
            user_id: account.id,
            login: account.login.clone(),
            roles,
            active_role,
            access_token,
            refresh_token,
            expires_at: claims.expires_at(),
        })
    }

    /// A session without an access token is treated as logged out
    pub fn has_access_token(&self) -> bool {
        !self.access_token.expose_secret().is_empty()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn switch_role(&mut self, role: Role) -> Result<(), SessionError> {
        if !self.has_role(role) {
            return Err(SessionError::RoleNotAssigned(role));
        }
        self.active_role = role;
        Ok(())
    }

    /// Replaces the assigned roles and moves the active role if it was revoked
    ///
    /// Returns the new active role if it changed
    pub fn reconcile_roles(&mut self, roles: Vec<Role>) -> Result<Option<Role>, SessionError> {
        let active_role =
            pick_active_role(&roles, Some(self.active_role)).ok_or(SessionError::NoRoles)?;
        self.roles = roles;
        if active_role == self.active_role {
            Ok(None)
        } else {
            self.active_role = active_role;
            Ok(Some(active_role))
        }
    }

    pub fn replace_tokens(
        &mut self,
        access_token: SecretString,
        refresh_token: SecretString,
        expires_at: Timestamp,
    ) {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self.expires_at = expires_at;
    }

    pub fn greeting(&self) -> String {
        format!("Hello, {}!", self.login)
    }
}

fn pick_active_role(roles: &[Role], preferred: Option<Role>) -> Option<Role> {
    match preferred {
        Some(role) if roles.contains(&role) => Some(role),
        _ => roles.first().copied(),
    }
}
