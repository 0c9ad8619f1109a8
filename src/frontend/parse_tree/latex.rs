//! Export of a parse tree as a standalone LaTeX document drawn with `forest`

use std::path::Path;

use super::ParseTree;

pub fn export(tree: &ParseTree, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, to_latex(tree))
}

pub fn to_latex(tree: &ParseTree) -> String {
    let mut body = String::new();
    write_node(tree, 1, &mut body);

    indoc::formatdoc!(
        r#"
        \documentclass[border=5pt]{{standalone}}

        \usepackage{{forest}}

        \begin{{document}}

        \begin{{forest}}
          for tree={{s sep=6pt, l sep=12pt, font=\small}}
        {0}\end{{forest}}

        \end{{document}}
        "#,
        body
    )
}

enum Step<'tree> {
    Open(&'tree ParseTree, usize),
    Close(usize),
}

fn write_node(tree: &ParseTree, depth: usize, output: &mut String) {
    let mut pending = vec![Step::Open(tree, depth)];

    while let Some(step) = pending.pop() {
        let (tree, depth) = match step {
            Step::Open(tree, depth) => (tree, depth),
            Step::Close(depth) => {
                output.push_str(&format!("{}]\n", "  ".repeat(depth)));
                continue;
            }
        };

        let indent = "  ".repeat(depth);

        match tree {
            ParseTree::Leaf(symbol) => {
                output.push_str(&format!(
                    "{indent}[{{\\texttt{{{}}}: {}}}]\n",
                    symbol.kind,
                    escape(&symbol.value)
                ));
            }
            ParseTree::Node { rule, children } => {
                let label = escape(&format!("<{rule}>"));

                if children.is_empty() {
                    output.push_str(&format!("{indent}[{{{label}}} [$\\varepsilon$]]\n"));
                    continue;
                }

                output.push_str(&format!("{indent}[{{{label}}}\n"));

                pending.push(Step::Close(depth));
                pending.extend(
                    children
                        .iter()
                        .rev()
                        .map(|child| Step::Open(child, depth + 1)),
                );
            }
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '^' => escaped.push_str("\\textasciicircum{}"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            '<' => escaped.push_str("\\textless{}"),
            '>' => escaped.push_str("\\textgreater{}"),
            '|' => escaped.push_str("\\textbar{}"),
            c => escaped.push(c),
        }
    }

    escaped
}
