pub mod accepted;
pub mod inquiry;
pub mod item;
pub mod tenant;
pub mod user;
