pub mod cli;
pub mod environment;
pub mod error;
pub mod freeze;
pub mod output;
pub mod parsers;
pub mod patcher;
pub mod pipeline;
pub mod pypi;
pub mod requirement;
pub mod resolver;
pub mod version;

pub use cli::Args;
pub use environment::InstalledSnapshot;
pub use error::FreezeError;
pub use pipeline::{FileOutcome, RunOptions, RunReport};
pub use pypi::PyPiClient;
pub use requirement::{normalize_name, Operator, Requirement, Specifier};
pub use resolver::{ResolveFailure, ResolveMode, Resolver};
pub use version::Version;
