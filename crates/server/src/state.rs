use std::sync::Arc;

use reservations_core::config::AuthConfig;
use reservations_core::TokenService;
use reservations_db::repositories::{
    AcceptedRepository, AuthRepository, InquiryRepository, ItemRepository, SqlAcceptedRepository,
    SqlAuthRepository, SqlInquiryRepository, SqlItemRepository, SqlTenantRepository,
    SqlUserRepository, TenantRepository, UserRepository,
};
use reservations_db::DbPool;

/// Shared handles cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemRepository>,
    pub inquiries: Arc<dyn InquiryRepository>,
    pub accepted: Arc<dyn AcceptedRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub tokens: Arc<TokenService>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn from_pool(db_pool: DbPool, auth: &AuthConfig) -> Self {
        Self {
            items: Arc::new(SqlItemRepository::new(db_pool.clone())),
            inquiries: Arc::new(SqlInquiryRepository::new(db_pool.clone())),
            accepted: Arc::new(SqlAcceptedRepository::new(db_pool.clone())),
            tenants: Arc::new(SqlTenantRepository::new(db_pool.clone())),
            users: Arc::new(SqlUserRepository::new(db_pool.clone())),
            auth: Arc::new(SqlAuthRepository::new(db_pool)),
            tokens: Arc::new(TokenService::from_config(auth)),
            bcrypt_cost: auth.bcrypt_cost,
        }
    }
}
