mod host;
mod instance;

pub use host::register;
pub use host::PluginHost;
pub use host::PluginRegistration;
pub use instance::pipe;
pub use instance::PipeReader;
pub use instance::PipeWriter;
pub use instance::PluginStarter;
