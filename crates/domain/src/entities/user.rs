use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserEmail, UserId, Username};

/// 注册用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: UserEmail,
    pub email_confirmed: bool,
    pub created_at: Timestamp,
}

/// 待持久化的用户，ID 由存储层分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub email: UserEmail,
    pub created_at: Timestamp,
}

impl NewUser {
    pub fn new(username: Username, email: UserEmail, created_at: Timestamp) -> Self {
        Self {
            username,
            email,
            created_at,
        }
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            email_confirmed: false,
            created_at: self.created_at,
        }
    }
}
