//! File actions module.
//!
//! # Relocation
//!
//! The relocate module moves duplicates into the backup tree with:
//! - Non-overwriting destination names (`name_1.ext`, `name_2.ext`, …)
//! - Optional mirroring of the source directory structure
//! - Copy verification before the source is removed
//! - Preserved permissions and timestamps
//!
//! ```no_run
//! use mirrorclean::actions::{plan_relocation, relocate};
//! use std::path::Path;
//!
//! let plan = plan_relocation(
//!     Path::new("/data"),
//!     Path::new("/data/backup_duplicates"),
//!     Path::new("/data/copy.txt"),
//!     false,
//! ).unwrap();
//! let result = relocate(&plan);
//! ```

pub mod relocate;

// Re-export commonly used types
pub use relocate::{
    plan_relocation, relocate, unique_destination, RelocateError, Relocated, RelocationPlan,
};
