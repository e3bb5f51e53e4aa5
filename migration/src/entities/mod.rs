pub mod click;
pub mod lead;
pub mod link;
pub mod usage_limit;
pub mod user;

pub use click::Entity as ClickEntity;
pub use lead::Entity as LeadEntity;
pub use link::Entity as LinkEntity;
pub use usage_limit::Entity as UsageLimitEntity;
pub use user::Entity as UserEntity;
