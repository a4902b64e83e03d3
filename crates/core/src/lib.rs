pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use auth::{TokenKind, TokenPair, TokenService};
pub use domain::accepted::{Accepted, AcceptedCreate, AcceptedId, NewAccepted};
pub use domain::inquiry::{Inquiry, InquiryCreate, InquiryId, LiveItem, NewInquiry};
pub use domain::item::{DatePriceId, DatePricePlan, Item, ItemDatePrice, ItemId, PriceSnapshot};
pub use domain::tenant::{Tenant, TenantId};
pub use domain::user::{NewUser, User, UserCredentials, UserId, UserPayload, UserUpdate};
pub use errors::{ApplicationError, DomainError, FieldError, InterfaceError};
