pub mod configuration;
pub mod environment;
pub mod error;
pub mod plugins;
mod routing;
mod run;

pub use routing::FileRouter;
pub use routing::GlobMatcher;
pub use run::run;
pub use run::RunMode;
pub use run::RunResult;
