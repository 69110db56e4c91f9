//! Cache names and cached value types of the domain services.

use meridian_cache::{CacheResult, TypeRegistry};
use meridian_core::{Department, Employee};

/// Cache holding employees, indexed by id, last name and email.
pub const EMP_CACHE: &str = "emp";

/// Cache holding departments by id.
pub const DEPT_CACHE: &str = "dept";

/// Registers every type the services put into a cache.
///
/// Must run before the codec is built; entries of unregistered types are
/// unreadable and treated as misses.
pub fn register_domain_types(registry: &mut TypeRegistry) -> CacheResult<()> {
    registry.register::<Employee>()?;
    registry.register::<Department>()?;
    Ok(())
}
