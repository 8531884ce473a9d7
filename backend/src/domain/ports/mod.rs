//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod bean_repository;
mod permission_repository;
mod roaster_repository;
mod user_repository;

#[cfg(test)]
pub use bean_repository::MockBeanRepository;
pub use bean_repository::{BeanRepository, BeanRepositoryError};
#[cfg(test)]
pub use permission_repository::MockPermissionRepository;
pub use permission_repository::{PermissionRepository, PermissionRepositoryError};
#[cfg(test)]
pub use roaster_repository::MockRoasterRepository;
pub use roaster_repository::{RoasterRepository, RoasterRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
