//! Shared model for `gcgrace`: the alteration descriptor, its validation, and
//! CQL statement rendering.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod statement;
pub mod types;

pub use config::{load_descriptor, DescriptorFile};
pub use descriptor::AlterationSpec;
pub use error::{ApplyError, ConfigError, ErrorKind, ValidationError};
pub use types::{CompactionClass, Descriptor, TableAlteration};
