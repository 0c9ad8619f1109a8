use colored::Colorize;

use super::ParseTree;

pub fn pretty_print_tree(tree: &ParseTree) {
    print!("{}", render(tree));
}

/// Indented, colored rendering of the tree
pub fn render(tree: &ParseTree) -> String {
    let mut output = String::new();
    let mut pending = vec![(tree, 0)];

    while let Some((tree, depth)) = pending.pop() {
        render_label(tree, depth, &mut output);
        pending.extend(tree.children().iter().rev().map(|child| (child, depth + 1)));
    }

    output
}

/// Same as [`render`] without terminal escape codes
pub fn render_plain(tree: &ParseTree) -> String {
    strip_ansi_escapes::strip_str(render(tree))
}

fn render_label(tree: &ParseTree, depth: usize, output: &mut String) {
    output.push_str(&"  ".repeat(depth));

    match tree {
        ParseTree::Leaf(symbol) => {
            output.push_str(&format!(
                "{} {}",
                symbol.kind.to_string().cyan(),
                symbol.value.yellow()
            ));

            if let Some(line) = symbol.line.0 {
                output.push_str(&format!(" {}", format!("@{line}").bright_black()));
            }
        }
        ParseTree::Node { rule, children } => {
            output.push_str(&format!("{}", format!("<{rule}>").magenta()));

            if children.is_empty() {
                output.push_str(&format!(" {}", "ε".white()));
            }
        }
    }

    output.push('\n');
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::frontend::{
        lexical_unit::LexicalUnit,
        parse_tree::NonTerminal,
        symbol::{SourceLine, Symbol},
    };

    #[test]
    fn plain_rendering_indents_children() {
        let tree = ParseTree::node(
            NonTerminal::Prod,
            vec![
                ParseTree::node(
                    NonTerminal::Atom,
                    vec![ParseTree::leaf(Symbol::new(
                        LexicalUnit::Number,
                        "3",
                        SourceLine::known(2),
                    ))],
                ),
                ParseTree::epsilon(NonTerminal::ProdPrime),
            ],
        );

        assert_eq!(
            render_plain(&tree),
            indoc! {"
                <Prod>
                  <Atom>
                    NUMBER 3 @2
                  <Prod'> ε
            "}
        );
    }
}
