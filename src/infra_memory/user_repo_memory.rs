use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, UserCredentialsRecord>,
    by_email: DashMap<String, UserId>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user while leaving any refresh-token records behind.
    pub fn remove(&self, user_id: UserId) -> Option<PublicUser> {
        let (_, rec) = self.users.remove(&user_id)?;
        self.by_email.remove(&rec.user.email);
        Some(rec.user)
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, AuthError> {
        let Some(user_id) = self.by_email.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|rec| rec.clone()))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<PublicUser>, AuthError> {
        Ok(self.users.get(&user_id).map(|rec| rec.user.clone()))
    }

    async fn create(&self, user: NewUser) -> Result<PublicUser, AuthError> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let public = PublicUser {
                    id: UserId::new(),
                    email: user.email,
                    name: user.name,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(
                    public.id,
                    UserCredentialsRecord {
                        user: public.clone(),
                        password_hash: user.password_hash,
                    },
                );
                slot.insert(public.id);
                Ok(public)
            }
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.remove(user_id).is_some())
    }
}
