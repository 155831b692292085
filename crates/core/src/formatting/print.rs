use super::print_items::PrintItems;
use super::print_write_items::print_write_items;
use super::print_write_items::Indentation;
use super::print_write_items::WriteItemsPrinter;
use super::printer::print_items;
use super::printer::LayoutError;
use super::printer::PrinterOptions;

#[derive(Clone)]
pub struct PrintOptions {
  /// The width the printer will attempt to keep lines under.
  pub max_width: u32,
  /// The number of columns of indentation.
  pub indent_width: u8,
  /// Whether to use tabs for indentation.
  pub use_tabs: bool,
  /// The newline character to use (ex. "\r\n" or "\n").
  pub new_line_text: &'static str,
}

/// Prints a layout tree to the final file text.
pub fn format(items: &PrintItems, options: &PrintOptions) -> Result<String, LayoutError> {
  let write_items = print_items(
    items,
    &PrinterOptions {
      max_width: options.max_width,
      indent_width: options.indent_width,
    },
  )?;
  Ok(print_write_items(
    write_items,
    WriteItemsPrinter {
      indent: if options.use_tabs {
        Indentation::Tabs
      } else {
        Indentation::Spaces(options.indent_width)
      },
      newline: options.new_line_text,
    },
  ))
}
