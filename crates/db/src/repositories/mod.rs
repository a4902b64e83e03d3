use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use reservations_core::domain::accepted::{Accepted, AcceptedId, NewAccepted};
use reservations_core::domain::inquiry::{Inquiry, InquiryId, NewInquiry};
use reservations_core::domain::item::{Item, ItemId, PriceSnapshot};
use reservations_core::domain::tenant::{Tenant, TenantId};
use reservations_core::domain::user::{NewUser, User, UserId, UserUpdate};
use reservations_core::errors::{ApplicationError, DomainError};

pub mod accepted;
pub mod auth;
pub mod inquiry;
pub mod item;
pub mod tenant;
pub mod user;

pub use accepted::SqlAcceptedRepository;
pub use auth::SqlAuthRepository;
pub use inquiry::SqlInquiryRepository;
pub use item::SqlItemRepository;
pub use tenant::SqlTenantRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password check failed: {0}")]
    PasswordCheck(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Conflict(message) => {
                Self::Domain(DomainError::InvariantViolation(message))
            }
            RepositoryError::InvalidCredentials => Self::InvalidCredentials,
            other => Self::Persistence(other.to_string()),
        }
    }
}

pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Item>, RepositoryError>;
    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError>;
    async fn create(&self, item: Item) -> Result<ItemId, RepositoryError>;
    /// Replaces the item row and reconciles its date prices to exactly `item.date_prices`.
    async fn update(&self, item: Item) -> Result<(), RepositoryError>;
    async fn delete(&self, id: ItemId) -> Result<(), RepositoryError>;
    async fn resolve_price(
        &self,
        id: ItemId,
        as_of: DateTime<Utc>,
    ) -> Result<PriceSnapshot, RepositoryError>;
}

#[async_trait]
pub trait InquiryRepository: Send + Sync {
    /// Freezes the item's title and current effective price into the new row.
    async fn create(&self, inquiry: NewInquiry) -> Result<InquiryId, RepositoryError>;
    async fn list(&self) -> Result<Vec<Inquiry>, RepositoryError>;
    async fn delete(&self, id: InquiryId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AcceptedRepository: Send + Sync {
    /// Newest acceptance first.
    async fn list(&self) -> Result<Vec<Accepted>, RepositoryError>;
    async fn process(&self, accepted: NewAccepted) -> Result<AcceptedId, RepositoryError>;
    async fn delete(&self, id: AcceptedId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Tenant>, RepositoryError>;
    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError>;
    async fn create(&self, tenant: Tenant) -> Result<TenantId, RepositoryError>;
    async fn update(&self, tenant: Tenant) -> Result<(), RepositoryError>;
    async fn delete(&self, id: TenantId) -> Result<(), RepositoryError>;
    async fn add_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<(), RepositoryError>;
    async fn remove_user(&self, tenant_id: TenantId, user_id: UserId)
        -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn create(&self, user: NewUser) -> Result<UserId, RepositoryError>;
    async fn update(&self, user: UserUpdate) -> Result<(), RepositoryError>;
    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<UserId, RepositoryError>;
    async fn has_access(&self, id: UserId) -> Result<bool, RepositoryError>;
}
