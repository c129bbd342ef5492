//! Storage crate: user record persistence and the store abstraction.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – UserRecord, UserInfo, UserPhoto, MemberStatus
//! - [`repository`] – UserStore trait
//! - [`user_repo`] – UserRepository (SQLite)
//! - [`inmemory`] – InMemoryUserStore
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod inmemory;
mod models;
mod repository;
mod sqlite_pool;
mod user_repo;

pub use error::{Result, StorageError};
pub use inmemory::InMemoryUserStore;
pub use models::{MemberStatus, UserInfo, UserPhoto, UserRecord};
pub use repository::UserStore;
pub use sqlite_pool::SqlitePoolManager;
pub use user_repo::UserRepository;
