use reflow_core::formatting::ir_helpers::new_line_group;
use reflow_core::formatting::Condition;
use reflow_core::formatting::FitPredicate;
use reflow_core::formatting::PrintItems;
use reflow_core::formatting::Signal;

use crate::configuration::BracePosition;
use crate::configuration::Configuration;
use crate::parsing::Expr;
use crate::parsing::File;
use crate::parsing::Node;
use crate::parsing::Statement;

pub fn generate(file: &File, config: &Configuration) -> PrintItems {
  gen_statements(&file.statements, config)
}

fn gen_statements(statements: &[Statement], config: &Configuration) -> PrintItems {
  let mut items = PrintItems::new();
  for (index, statement) in statements.iter().enumerate() {
    if index > 0 {
      items.push_signal(Signal::NewLine);
      if statement.blank_line_before {
        items.push_signal(Signal::NewLine);
      }
    }
    items.extend(gen_statement(statement, config));
  }
  items
}

fn gen_statement(statement: &Statement, config: &Configuration) -> PrintItems {
  let mut items = PrintItems::new();
  for (index, node) in statement.nodes.iter().enumerate() {
    match node {
      Node::Expr(expr) => {
        if index > 0 {
          items.push_str(" ");
        }
        items.extend(gen_expr(expr, config));
      }
      Node::Block(statements) => {
        if index > 0 {
          items.extend(gen_brace_separator(config));
        }
        items.extend(gen_block(statements, config));
      }
    }
  }
  items
}

fn gen_brace_separator(config: &Configuration) -> PrintItems {
  match config.brace_position {
    BracePosition::SameLine => PrintItems::from(" "),
    BracePosition::NextLine => PrintItems::from(Signal::NewLine),
    BracePosition::SameLineUnlessWide => PrintItems::from(Condition::new(
      "braceSameLineUnlessWide",
      FitPredicate::TruePathFits,
      Some(PrintItems::from(" ")),
      Some(PrintItems::from(Signal::NewLine)),
    )),
  }
}

fn gen_block(statements: &[Statement], config: &Configuration) -> PrintItems {
  let mut items = PrintItems::new();
  items.push_str("{");
  if statements.is_empty() {
    items.push_str("}");
    return items;
  }
  let mut inner = PrintItems::new();
  inner.push_signal(Signal::NewLine);
  inner.extend(gen_statements(statements, config));
  items.push_indent(inner);
  items.push_signal(Signal::NewLine);
  items.push_str("}");
  items
}

fn gen_expr(expr: &Expr, config: &Configuration) -> PrintItems {
  match expr {
    Expr::Word(text) => PrintItems::from(text.as_str()),
    Expr::Call { callee, args } => gen_call(callee, args, config),
  }
}

fn gen_call(callee: &str, args: &[Expr], config: &Configuration) -> PrintItems {
  let mut items = PrintItems::new();
  items.push_string(format!("{}(", callee));
  if args.is_empty() {
    items.push_str(")");
    return items;
  }
  let mut separated_args = PrintItems::new();
  for (index, arg) in args.iter().enumerate() {
    if index > 0 {
      separated_args.push_str(",");
      separated_args.push_signal(Signal::SpaceOrNewLine);
    }
    separated_args.extend(gen_expr(arg, config));
  }
  if config.prefer_hanging {
    // the first argument stays on the call's line and the rest hang at
    // one indentation level
    items.push_indent(separated_args);
    items.push_str(")");
  } else {
    let mut inner = PrintItems::new();
    inner.push_signal(Signal::PossibleNewLine);
    inner.extend(separated_args);
    items.push_indent(inner);
    items.push_signal(Signal::PossibleNewLine);
    items.push_str(")");
  }
  new_line_group("call", items)
}
