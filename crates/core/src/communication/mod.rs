mod message;
mod reader_writer;

pub use message::FormatResponseBody;
pub use message::MessageBody;
pub use message::PluginMessage;
pub use message::PROTOCOL_VERSION;
pub use reader_writer::MessageReader;
pub use reader_writer::MessageWriter;
pub use reader_writer::SUCCESS_BYTES;
