//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: `models.rs` and `schema.rs` never leak to the domain.
//! - **Bounded operations**: every call runs under the pool's query timeout.
//!
//! # Example
//!
//! ```no_run
//! use roastery::outbound::persistence::{DbPool, DieselRoasterRepository, PoolConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/roastery")).await?;
//! let roasters = DieselRoasterRepository::new(pool);
//! # let _ = roasters;
//! # Ok(())
//! # }
//! ```

mod diesel_bean_repository;
pub(crate) mod diesel_helpers;
mod diesel_permission_repository;
mod diesel_roaster_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_bean_repository::DieselBeanRepository;
pub use diesel_permission_repository::DieselPermissionRepository;
pub use diesel_roaster_repository::DieselRoasterRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
