pub mod ir_helpers;
mod print;
mod print_items;
mod print_write_items;
mod printer;
mod writer;

pub use print::format;
pub use print::PrintOptions;
pub use print_items::Condition;
pub use print_items::FitPredicate;
pub use print_items::Group;
pub use print_items::PrintItem;
pub use print_items::PrintItems;
pub use print_items::Signal;
pub use print_items::StringContainer;
pub use printer::LayoutError;
