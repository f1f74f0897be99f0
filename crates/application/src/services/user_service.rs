use std::sync::Arc;

use domain::{DomainError, NewUser, RepositoryError, UserEmail, UserId, Username};

use crate::{
    clock::Clock,
    dto::{UserDto, UserSummaryDto},
    error::ApplicationError,
    repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserDto, ApplicationError> {
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;

        if self
            .deps
            .user_repository
            .find_by_username(username.clone())
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }
        if self.email_in_use(&email).await? {
            return Err(DomainError::EmailAlreadyInUse.into());
        }

        let draft = NewUser::new(username, email.clone(), self.deps.clock.now());
        let user = match self.deps.user_repository.create(draft).await {
            Ok(user) => user,
            // 并发注册时由存储层兜底
            Err(RepositoryError::Conflict) => {
                let conflict = if self.email_in_use(&email).await? {
                    DomainError::EmailAlreadyInUse
                } else {
                    DomainError::UserAlreadyExists
                };
                return Err(conflict.into());
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(UserDto::from(&user))
    }

    async fn email_in_use(&self, email: &UserEmail) -> Result<bool, ApplicationError> {
        Ok(self
            .deps
            .user_repository
            .find_by_email(email.clone())
            .await?
            .is_some())
    }

    pub async fn get_user(&self, id: i64) -> Result<UserDto, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(UserId(id))
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(UserDto::from(&user))
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummaryDto>, ApplicationError> {
        let users = self.deps.user_repository.list().await?;
        Ok(users.iter().map(UserSummaryDto::from).collect())
    }

    /// 按用户名片段搜索；片段为空视为参数错误，没有结果视为未找到
    pub async fn search_users(
        &self,
        fragment: &str,
    ) -> Result<Vec<UserSummaryDto>, ApplicationError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(DomainError::invalid_argument("username", "is required for search").into());
        }

        let users = self
            .deps
            .user_repository
            .search_by_username(fragment.to_owned())
            .await?;
        if users.is_empty() {
            return Err(DomainError::UserNotFound.into());
        }
        Ok(users.iter().map(UserSummaryDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use chrono::{TimeZone, Utc};
    use domain::{Timestamp, User};

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 11, 30, 12, 0, 0).unwrap()))
    }

    fn user(id: i64, name: &str) -> User {
        NewUser::new(
            Username::parse(name).unwrap(),
            UserEmail::parse(format!("{name}@example.com")).unwrap(),
            Utc.with_ymd_and_hms(2024, 11, 30, 12, 0, 0).unwrap(),
        )
        .into_user(UserId(id))
    }

    fn service(repo: MockUserRepository) -> UserService {
        UserService::new(UserServiceDependencies {
            user_repository: Arc::new(repo),
            clock: clock(),
        })
    }

    #[tokio::test]
    async fn create_user_persists_and_returns_dto() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email()
            .withf(|email| email.as_str() == "alice@example.com")
            .returning(|_| Ok(None));
        repo.expect_create()
            .times(1)
            .returning(|draft| Ok(draft.into_user(UserId(1))));

        let dto = service(repo)
            .create_user(CreateUserRequest {
                username: "alice".into(),
                email: "Alice@Example.com".into(),
            })
            .await
            .unwrap();

        assert_eq!(dto.id, 1);
        assert_eq!(dto.email, "alice@example.com");
        assert!(!dto.email_confirmed);
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_username() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(|_| Ok(Some(user(1, "alice"))));
        repo.expect_create().never();

        let err = service(repo)
            .create_user(CreateUserRequest {
                username: "alice".into(),
                email: "other@example.com".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn create_user_rejects_email_in_use() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(user(1, "alice"))));
        repo.expect_create().never();

        let err = service(repo)
            .create_user(CreateUserRequest {
                username: "alice2".into(),
                email: "Alice@Example.com".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::EmailAlreadyInUse)
        ));
    }

    #[tokio::test]
    async fn storage_conflict_maps_to_user_exists() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create()
            .returning(|_| Err(RepositoryError::Conflict));

        let err = service(repo)
            .create_user(CreateUserRequest {
                username: "alice".into(),
                email: "alice@example.com".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn get_missing_user_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let err = service(repo).get_user(42).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Domain(DomainError::UserNotFound)));
    }

    #[tokio::test]
    async fn search_requires_fragment_and_results() {
        let mut repo = MockUserRepository::new();
        repo.expect_search_by_username()
            .withf(|fragment| fragment == "ali")
            .returning(|_| Ok(vec![user(1, "alice")]));
        let service = service(repo);

        let found = service.search_users(" ali ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "alice");

        assert!(matches!(
            service.search_users("  ").await,
            Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
        ));
    }

    #[tokio::test]
    async fn search_without_match_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_search_by_username().returning(|_| Ok(Vec::new()));

        assert!(matches!(
            service(repo).search_users("zed").await,
            Err(ApplicationError::Domain(DomainError::UserNotFound))
        ));
    }
}
