//! Nupack build tasks
//!
//! The build-host side of packing: placing build outputs inside the
//! package, deduplicating them, expanding property templates against
//! library properties, discovering the package version, and driving a
//! whole pack invocation through [`PackTask`].

pub mod diagnostic;
pub mod error;
pub mod expand;
pub mod pipeline;
pub mod registry;
pub mod targets;
pub mod version_gen;

pub use diagnostic::{codes, Diagnostic, Diagnostics, Severity};
pub use error::{BuildError, BuildResult};
pub use expand::{
    expand, expand_properties, Library, PropertyBag, PropertyBagTable, PropertyExtractor,
    PropertyTemplate, Resolution, VariableResolver,
};
pub use pipeline::{DependencyInput, PackOutcome, PackTask, ReferenceInput, VersionDiscovery};
pub use registry::{register, FileRegistry};
pub use targets::{classify, classify_all, BuildOutput, ClassifiedFile, DeclaredPlatform, PackageArea};
pub use version_gen::{discover_version, GeneratedVersion};

// Re-export nupack-package for convenience
pub use nupack_package;
