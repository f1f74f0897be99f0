use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ChatId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    pub is_group: bool,
    pub member_ids: Vec<UserId>,
    pub created_at: Timestamp,
}

impl Chat {
    /// 成员与给定 ID 完全一致（忽略顺序）；给定 ID 中有重复时数量对不上，不算匹配
    pub fn has_exact_members(&self, user_ids: &[UserId]) -> bool {
        if user_ids.len() != self.member_ids.len() {
            return false;
        }
        let members: BTreeSet<_> = self.member_ids.iter().copied().collect();
        let wanted: BTreeSet<_> = user_ids.iter().copied().collect();
        members == wanted
    }
}

/// 待持久化的聊天
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
    pub name: String,
    pub is_group: bool,
    pub member_ids: Vec<UserId>,
    pub created_at: Timestamp,
}

impl NewChat {
    pub const MAX_NAME_CHARS: usize = 100;

    pub fn new(
        name: impl Into<String>,
        is_group: bool,
        member_ids: Vec<UserId>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(name.into())?;
        let mut member_ids = member_ids;
        member_ids.sort_unstable();
        member_ids.dedup();
        Ok(Self {
            name,
            is_group,
            member_ids,
            created_at,
        })
    }

    pub fn into_chat(self, id: ChatId) -> Chat {
        Chat {
            id,
            name: self.name,
            is_group: self.is_group,
            member_ids: self.member_ids,
            created_at: self.created_at,
        }
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_argument("name", "cannot be empty"));
        }
        if trimmed.chars().count() > Self::MAX_NAME_CHARS {
            return Err(DomainError::invalid_argument("name", "too long"));
        }
        Ok(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn new_chat_dedups_members_and_validates_name() {
        let chat = NewChat::new(" Team ", true, vec![UserId(3), UserId(1), UserId(3)], Utc::now())
            .unwrap();
        assert_eq!(chat.name, "Team");
        assert_eq!(chat.member_ids, vec![UserId(1), UserId(3)]);

        assert!(NewChat::new("  ", false, Vec::new(), Utc::now()).is_err());
    }

    #[test]
    fn exact_member_match_ignores_order() {
        let chat = NewChat::new("pair", false, vec![UserId(1), UserId(2)], Utc::now())
            .unwrap()
            .into_chat(ChatId(1));
        assert!(chat.has_exact_members(&[UserId(2), UserId(1)]));
        assert!(!chat.has_exact_members(&[UserId(1)]));
        assert!(!chat.has_exact_members(&[UserId(1), UserId(2), UserId(3)]));
    }

    #[test]
    fn repeated_ids_do_not_match_a_smaller_chat() {
        let solo = NewChat::new("solo", false, vec![UserId(1)], Utc::now())
            .unwrap()
            .into_chat(ChatId(1));
        assert!(solo.has_exact_members(&[UserId(1)]));
        assert!(!solo.has_exact_members(&[UserId(1), UserId(1)]));

        let pair = NewChat::new("pair", false, vec![UserId(1), UserId(2)], Utc::now())
            .unwrap()
            .into_chat(ChatId(2));
        assert!(!pair.has_exact_members(&[UserId(1), UserId(1)]));
    }
}
