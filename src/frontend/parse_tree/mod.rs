//! Concrete parse tree. Every production taken by the parser is recorded,
//! epsilon productions included (as internal nodes without children).

use strum::{Display, EnumString};

use super::{lexical_unit::LexicalUnit, symbol::Symbol};

pub mod latex;
pub mod pretty_print;

/// Grammar variables. `Call` and `CondB` belong to the grammar's vocabulary
/// but no rule of the parser produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum NonTerminal {
    Program,
    Code,
    Instruction,
    Assign,
    If,
    While,
    Call,
    Output,
    Input,
    ExprArith,
    Prod,
    #[strum(serialize = "ExprArith'")]
    ExprArithPrime,
    #[strum(serialize = "Prod'")]
    ProdPrime,
    Atom,
    Cond,
    C,
    CondA,
    CondB,
    D,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    Leaf(Symbol),
    Node {
        rule: NonTerminal,
        children: Vec<ParseTree>,
    },
}

/// What a node is labeled with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label<'tree> {
    Terminal(&'tree Symbol),
    NonTerminal(NonTerminal),
}

impl core::fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Terminal(symbol) => write!(f, "{}", symbol.kind),
            Label::NonTerminal(rule) => write!(f, "<{rule}>"),
        }
    }
}

impl ParseTree {
    pub fn leaf(symbol: Symbol) -> Self {
        Self::Leaf(symbol)
    }

    pub fn node(rule: NonTerminal, children: Vec<ParseTree>) -> Self {
        Self::Node { rule, children }
    }

    /// A node for an epsilon production
    pub fn epsilon(rule: NonTerminal) -> Self {
        Self::node(rule, Vec::new())
    }

    pub fn label(&self) -> Label<'_> {
        match self {
            ParseTree::Leaf(symbol) => Label::Terminal(symbol),
            ParseTree::Node { rule, .. } => Label::NonTerminal(*rule),
        }
    }

    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Leaf(_) => &[],
            ParseTree::Node { children, .. } => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ParseTree::Leaf(_))
    }

    pub fn rule(&self) -> Option<NonTerminal> {
        match self {
            ParseTree::Leaf(_) => None,
            ParseTree::Node { rule, .. } => Some(*rule),
        }
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            ParseTree::Leaf(symbol) => Some(symbol),
            ParseTree::Node { .. } => None,
        }
    }

    /// Terminal frontier of the tree, left to right
    pub fn leaves(&self) -> Vec<&Symbol> {
        let mut leaves = Vec::new();
        let mut pending = vec![self];

        while let Some(tree) = pending.pop() {
            match tree {
                ParseTree::Leaf(symbol) => leaves.push(symbol),
                ParseTree::Node { children, .. } => pending.extend(children.iter().rev()),
            }
        }

        leaves
    }

    /// Source line of the leftmost terminal that has one
    pub fn first_line(&self) -> Option<usize> {
        self.leaves().into_iter().find_map(|symbol| symbol.line.0)
    }

    /// Returns true when this is a leaf of the given kind
    pub fn is_terminal(&self, kind: LexicalUnit) -> bool {
        self.symbol().is_some_and(|symbol| symbol.is(kind))
    }
}

// `<Code>` nests once per statement, so the default recursive drop would
// overflow the stack on long programs
impl Drop for ParseTree {
    fn drop(&mut self) {
        let ParseTree::Node { children, .. } = self else {
            return;
        };

        let mut pending = std::mem::take(children);

        while let Some(mut tree) = pending.pop() {
            if let ParseTree::Node { children, .. } = &mut tree {
                pending.append(children);
            }
        }
    }
}
