use std::rc::Rc;

use unicode_width::UnicodeWidthStr;

/// The layout tree a plugin produces for a file.
///
/// This is a closed set of nodes. All conditional behaviour is expressed
/// through [`Condition`] with a [`FitPredicate`], so the printer can
/// evaluate the tree without calling back into the plugin.
#[derive(Clone, Default)]
pub struct PrintItems {
  pub(super) items: Vec<PrintItem>,
}

impl PrintItems {
  pub fn new() -> Self {
    PrintItems { items: Vec::new() }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn push_str(&mut self, item: &str) {
    self.push_string(item.to_string())
  }

  pub fn push_string(&mut self, item: String) {
    self.items.push(PrintItem::Text(Rc::new(StringContainer::new(item))));
  }

  pub fn push_signal(&mut self, signal: Signal) {
    self.items.push(PrintItem::Signal(signal));
  }

  pub fn push_condition(&mut self, condition: Condition) {
    self.items.push(PrintItem::Condition(Rc::new(condition)));
  }

  pub fn push_group(&mut self, group: Group) {
    self.items.push(PrintItem::Group(Rc::new(group)));
  }

  pub fn push_indent(&mut self, items: PrintItems) {
    self.items.push(PrintItem::Indent(Rc::new(items)));
  }

  pub fn extend(&mut self, items: PrintItems) {
    self.items.extend(items.items);
  }

  pub fn iter(&self) -> std::slice::Iter<'_, PrintItem> {
    self.items.iter()
  }

  /// Gets a diagnostic representation of the tree for debugging tests.
  pub fn get_as_text(&self) -> String {
    fn get_items_as_text(items: &PrintItems, indent_text: String) -> String {
      let mut text = String::new();
      for item in items.iter() {
        match item {
          PrintItem::Signal(signal) => text.push_str(&get_line(format!("Signal::{:?}", signal), &indent_text)),
          PrintItem::Text(container) => text.push_str(&get_line(format!("`{}`", container.text), &indent_text)),
          PrintItem::Indent(inner) => {
            text.push_str(&get_line("Indent".to_string(), &indent_text));
            text.push_str(&get_items_as_text(inner, format!("{}  ", indent_text)));
          }
          PrintItem::Group(group) => {
            text.push_str(&get_line(format!("Group: {}", group.name), &indent_text));
            text.push_str(&get_items_as_text(&group.items, format!("{}  ", indent_text)));
          }
          PrintItem::Condition(condition) => {
            text.push_str(&get_line(format!("Condition: {}", condition.name), &indent_text));
            if let Some(true_path) = &condition.true_path {
              text.push_str(&get_line("  true:".to_string(), &indent_text));
              text.push_str(&get_items_as_text(true_path, format!("{}    ", indent_text)));
            }
            if let Some(false_path) = &condition.false_path {
              text.push_str(&get_line("  false:".to_string(), &indent_text));
              text.push_str(&get_items_as_text(false_path, format!("{}    ", indent_text)));
            }
          }
        }
      }
      text
    }

    fn get_line(text: String, indent_text: &str) -> String {
      format!("{}{}\n", indent_text, text)
    }

    get_items_as_text(self, String::new())
  }
}

impl From<&str> for PrintItems {
  fn from(value: &str) -> Self {
    let mut items = PrintItems::new();
    items.push_str(value);
    items
  }
}

impl From<String> for PrintItems {
  fn from(value: String) -> Self {
    let mut items = PrintItems::new();
    items.push_string(value);
    items
  }
}

impl From<Signal> for PrintItems {
  fn from(value: Signal) -> Self {
    let mut items = PrintItems::new();
    items.push_signal(value);
    items
  }
}

impl From<Condition> for PrintItems {
  fn from(value: Condition) -> Self {
    let mut items = PrintItems::new();
    items.push_condition(value);
    items
  }
}

impl From<Group> for PrintItems {
  fn from(value: Group) -> Self {
    let mut items = PrintItems::new();
    items.push_group(value);
    items
  }
}

/// A single node in the layout tree.
#[derive(Clone)]
pub enum PrintItem {
  Text(Rc<StringContainer>),
  Signal(Signal),
  /// Child items printed one indentation level deeper.
  Indent(Rc<PrintItems>),
  /// A named region measured as a unit for width fitting.
  Group(Rc<Group>),
  Condition(Rc<Condition>),
}

#[derive(Clone, PartialEq, Eq, Copy, Debug)]
pub enum Signal {
  /// Signal that a new line should occur based on the printer settings.
  NewLine,
  /// Signal that the current location could be a newline when
  /// exceeding the line width.
  SpaceOrNewLine,
  /// Signal that the current location should be a newline when the
  /// containing group does not fit, and nothing otherwise.
  PossibleNewLine,
  /// Signal that the next character printed must be a newline. If the
  /// next item is already a newline then nothing extra is emitted.
  ExpectNewLine,
  /// Signal that a tab should occur regardless of indentation settings.
  Tab,
}

/// A named measurement boundary. The printer measures the flat width of
/// the group's contents to decide whether its soft break points collapse
/// or break.
#[derive(Clone)]
pub struct Group {
  /// Name for debugging purposes.
  pub name: &'static str,
  pub items: PrintItems,
}

impl Group {
  pub fn new(name: &'static str, items: PrintItems) -> Self {
    Group { name, items }
  }
}

/// The closed set of predicates a [`Condition`] may test.
#[derive(Clone, PartialEq, Eq, Copy, Debug)]
pub enum FitPredicate {
  /// True when the condition's true path fits on the remaining line width.
  TruePathFits,
  /// True when the printer is at the start of a line (only indentation
  /// written so far).
  StartOfLine,
}

/// Conditionally prints items based on a [`FitPredicate`].
#[derive(Clone)]
pub struct Condition {
  /// Name for debugging purposes.
  pub name: &'static str,
  pub predicate: FitPredicate,
  /// The items to print when the predicate is true.
  pub true_path: Option<PrintItems>,
  /// The items to print when the predicate is false.
  pub false_path: Option<PrintItems>,
}

impl Condition {
  pub fn new(name: &'static str, predicate: FitPredicate, true_path: Option<PrintItems>, false_path: Option<PrintItems>) -> Self {
    Condition {
      name,
      predicate,
      true_path,
      false_path,
    }
  }
}

/// A piece of text with a cached display width.
#[derive(Clone)]
pub struct StringContainer {
  /// The text value.
  pub text: String,
  /// The display width of the text, in terminal columns.
  pub width: u32,
}

impl StringContainer {
  pub fn new(text: String) -> Self {
    debug_assert!(!text.contains('\n'), "text should not contain newlines: {}", text);
    debug_assert!(!text.contains('\t'), "text should not contain tabs: {}", text);
    let width = UnicodeWidthStr::width(text.as_str()) as u32;
    StringContainer { text, width }
  }
}
