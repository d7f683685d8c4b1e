//! Resource identity: types, catalog lookup, inventory, resolution

pub mod catalog;
pub mod identity;
pub mod inventory;
pub mod resolver;

pub use catalog::{CloudElement, HttpCatalog, ResourceCatalog};
pub use identity::{ResourceIdentity, ResourceType};
pub use inventory::{ResourceInventory, StaticInventory};
pub use resolver::{CatalogRef, IdentityRequest, ResourceIdentityResolver};
