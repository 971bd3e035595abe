#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use wms_admin_portal::{
    AppConfig, AppState,
    models::{NewUser, UserAccount, UserListFilter, UserSummary},
    password,
    repository::{RepositoryError, RepositoryState, UserRepository},
    session::{Role, SessionIdentity},
};

pub const PASSWORD: &str = "correct-horse-battery";

pub const SUPERADMIN_ID: i32 = 1;
pub const ADMIN_ID: i32 = 2;
pub const USER_ID: i32 = 3;
pub const DISABLED_ID: i32 = 4;

// --- Mock Repository ---

/// In-memory equivalent of the listing predicate in `PostgresRepository`.
pub fn matches_filter(filter: &UserListFilter, user: &UserSummary) -> bool {
    let role_ok = filter.role.is_none_or(|role| user.role == role);
    let search_ok = match &filter.search {
        None => true,
        Some(term) => {
            let q = term.to_lowercase();
            [&user.first_name, &user.last_name, &user.email, &user.username]
                .iter()
                .any(|field| field.to_lowercase().contains(&q))
        }
    };
    role_ok && search_ok
}

#[derive(Debug, Clone)]
pub struct MockUser {
    pub account: UserAccount,
    pub phone: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MockUser {
    fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.account.id,
            username: self.account.username.clone(),
            first_name: self.account.first_name.clone(),
            last_name: self.account.last_name.clone(),
            email: self.account.email.clone(),
            phone: self.phone.clone(),
            role: self.account.role,
            is_active: self.account.is_active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        }
    }
}

/// In-memory stand-in for `superadmin_users`. `fail` turns every call into a
/// database error. `stale_exists` makes `exists` always answer false, as if a
/// concurrent sign-up inserted the row after the check.
#[derive(Default)]
pub struct MockUserRepo {
    pub users: Mutex<Vec<MockUser>>,
    pub fail: bool,
    pub stale_exists: bool,
}

impl MockUserRepo {
    /// Four accounts: a superadmin, an admin, a user, and a disabled user,
    /// all with `PASSWORD`. Later ids are newer.
    pub fn seeded() -> Self {
        let hash = password::hash(PASSWORD).unwrap();
        let base = Utc::now() - Duration::days(30);
        let people = [
            (SUPERADMIN_ID, "root", "root@wms.test", "Grace", "Hopper", Role::Superadmin, true),
            (ADMIN_ID, "shiftlead", "lead@wms.test", "Ada", "Okafor", Role::Admin, true),
            (USER_ID, "picker", "picker@wms.test", "Lin", "Wei", Role::User, true),
            (DISABLED_ID, "gone", "gone@wms.test", "Old", "Timer", Role::User, false),
        ];
        let users = people
            .into_iter()
            .map(|(id, username, email, first, last, role, active)| MockUser {
                account: UserAccount {
                    id,
                    username: username.to_string(),
                    email: email.to_string(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    password_hash: hash.clone(),
                    role,
                    is_active: active,
                },
                phone: None,
                last_login_at: None,
                created_at: base + Duration::days(i64::from(id)),
            })
            .collect();
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    pub fn racing() -> Self {
        Self {
            stale_exists: true,
            ..Self::seeded()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get(&self, id: i32) -> Option<MockUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.account.id == id)
            .cloned()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepo {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserAccount>, RepositoryError> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.account.username == login || u.account.email == login)
            .map(|u| u.account.clone()))
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool, RepositoryError> {
        self.check()?;
        if self.stale_exists {
            return Ok(false);
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.account.username == username || u.account.email == email))
    }

    async fn create_user(&self, user: NewUser) -> Result<UserAccount, RepositoryError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        // Same unique constraints as the table.
        if users
            .iter()
            .any(|u| u.account.username == user.username || u.account.email == user.email)
        {
            return Err(RepositoryError::Duplicate);
        }
        let id = users.iter().map(|u| u.account.id).max().unwrap_or(0) + 1;
        let account = UserAccount {
            id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
        };
        users.push(MockUser {
            account: account.clone(),
            phone: user.phone,
            last_login_at: None,
            created_at: Utc::now(),
        });
        Ok(account)
    }

    async fn touch_last_login(&self, id: i32) -> Result<(), RepositoryError> {
        self.check()?;
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.account.id == id) {
            u.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list_users(&self, filter: &UserListFilter) -> Result<Vec<UserSummary>, RepositoryError> {
        self.check()?;
        let mut rows: Vec<UserSummary> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .map(MockUser::summary)
            .filter(|s| matches_filter(filter, s))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_role(&self, id: i32, role: Role) -> Result<Option<Role>, RepositoryError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.account.id == id).map(|u| {
            u.account.role = role;
            role
        }))
    }

    async fn delete_user(&self, id: i32) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.account.id != id);
        Ok(users.len() < before)
    }
}

// --- State & Session Helpers ---

pub fn app_state(repo: Arc<MockUserRepo>) -> AppState {
    AppState::new(repo as RepositoryState, AppConfig::default())
}

pub fn token_for(state: &AppState, user_id: i32, role: Role) -> String {
    state
        .keys
        .issue(&SessionIdentity {
            user_id: i64::from(user_id),
            email: format!("user{user_id}@wms.test"),
            first_name: "Test".to_string(),
            last_name: "Principal".to_string(),
            role,
        })
        .unwrap()
}

pub fn cookie_for(state: &AppState, user_id: i32, role: Role) -> String {
    format!("session={}", token_for(state, user_id, role))
}
