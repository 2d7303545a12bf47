//! Magefile discovery
//!
//! Locates the project's magefile, scans it for targets and translates
//! between `namespace:Method` and the flattened names mage accepts.

pub mod discovery;
pub mod gosource;
pub mod location;
pub mod normalize;

pub use discovery::{
    scan, Catalog, CommandDiscovery, CommandLookup, DiscoveredCommand, TargetKind,
};
pub use gosource::{parse_source, Declaration, SourceFile};
pub use location::{ScriptLocation, ScriptLocator, MAGEFILES_DIR, MAGEFILE_NAME};
pub use normalize::{lookup_key, normalize, NAMESPACE_SEPARATOR};
