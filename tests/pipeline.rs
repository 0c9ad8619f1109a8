use indoc::indoc;
use mktemp::Temp;

use yalcc::{
    CompileError,
    backend::codegen::{CodeGenerator, CodegenOptions, generate},
    frontend::{
        lexical_unit::LexicalUnit,
        parse_tree::{NonTerminal, ParseTree, latex, pretty_print::render_plain},
        parser::Parser,
        symbol::{SourceLine, Symbol},
        token_stream::{TokenStream, UnknownUnitPolicy},
    },
};

// Prog Gcd Is
//   Input(a);
//   b := a * 2 + 1;
//   If {b <= 10} Then Print(b); End;
//   While {a < b} Do a := a + 1; End;
// End
const PROGRAM: &str = indoc! {"
    line: 1 token: Prog lexical unit: PROG
    line: 1 token: Gcd lexical unit: PROGNAME
    line: 1 token: Is lexical unit: IS
    line: 2 token: Input lexical unit: INPUT
    line: 2 token: ( lexical unit: LPAREN
    line: 2 token: a lexical unit: VARNAME
    line: 2 token: ) lexical unit: RPAREN
    line: 2 token: ; lexical unit: SEMI
    line: 3 token: b lexical unit: VARNAME
    line: 3 token: := lexical unit: ASSIGN
    line: 3 token: a lexical unit: VARNAME
    line: 3 token: * lexical unit: TIMES
    line: 3 token: 2 lexical unit: NUMBER
    line: 3 token: + lexical unit: PLUS
    line: 3 token: 1 lexical unit: NUMBER
    line: 3 token: ; lexical unit: SEMI
    line: 4 token: If lexical unit: IF
    line: 4 token: { lexical unit: LBRACK
    line: 4 token: b lexical unit: VARNAME
    line: 4 token: <= lexical unit: SMALEQ
    line: 4 token: 10 lexical unit: NUMBER
    line: 4 token: } lexical unit: RBRACK
    line: 4 token: Then lexical unit: THEN
    line: 4 token: Print lexical unit: PRINT
    line: 4 token: ( lexical unit: LPAREN
    line: 4 token: b lexical unit: VARNAME
    line: 4 token: ) lexical unit: RPAREN
    line: 4 token: ; lexical unit: SEMI
    line: 4 token: End lexical unit: END
    line: 4 token: ; lexical unit: SEMI
    line: 5 token: While lexical unit: WHILE
    line: 5 token: { lexical unit: LBRACK
    line: 5 token: a lexical unit: VARNAME
    line: 5 token: < lexical unit: SMALLER
    line: 5 token: b lexical unit: VARNAME
    line: 5 token: } lexical unit: RBRACK
    line: 5 token: Do lexical unit: DO
    line: 5 token: a lexical unit: VARNAME
    line: 5 token: := lexical unit: ASSIGN
    line: 5 token: a lexical unit: VARNAME
    line: 5 token: + lexical unit: PLUS
    line: 5 token: 1 lexical unit: NUMBER
    line: 5 token: ; lexical unit: SEMI
    line: 5 token: End lexical unit: END
    line: 5 token: ; lexical unit: SEMI
    line: 6 token: End lexical unit: END
    token: EOS lexical unit: EOS
"};

const EXPECTED_IR: &str = indoc! {r#"
    ; Declare external functions for I/O
    declare i32 @printf(i8*, ...)
    declare i32 @scanf(i8*, ...)

    ; Format strings
    @.str_int = private unnamed_addr constant [4 x i8] c"%d\0A\00", align 1
    @.str_read = private unnamed_addr constant [3 x i8] c"%d\00", align 1

    define i32 @main() {
      %1 = alloca i32, align 4
      %2 = getelementptr inbounds [3 x i8], [3 x i8]* @.str_read, i32 0, i32 0
      %3 = call i32 (i8*, ...) @scanf(i8* %2, i32* %1)
      %4 = alloca i32, align 4
      %5 = load i32, i32* %1, align 4
      %6 = mul nsw i32 %5, 2
      %7 = add nsw i32 %6, 1
      store i32 %7, i32* %4, align 4
      %8 = load i32, i32* %4, align 4
      %9 = icmp sle i32 %8, 10
      br i1 %9, label %label0, label %label1
    label0:
      %10 = load i32, i32* %4, align 4
      %11 = getelementptr inbounds [4 x i8], [4 x i8]* @.str_int, i32 0, i32 0
      %12 = call i32 (i8*, ...) @printf(i8* %11, i32 %10)
      br label %label2
    label1:
      br label %label2
    label2:
      br label %label3
    label3:
      %13 = load i32, i32* %1, align 4
      %14 = load i32, i32* %4, align 4
      %15 = icmp slt i32 %13, %14
      br i1 %15, label %label4, label %label5
    label4:
      %16 = load i32, i32* %1, align 4
      %17 = add nsw i32 %16, 1
      store i32 %17, i32* %1, align 4
      br label %label3
    label5:
      ret i32 0
    }
"#};

fn parse(text: &str) -> ParseTree {
    let stream = TokenStream::decode(text, UnknownUnitPolicy::Reject).unwrap();
    Parser::parse_program(stream.symbols()).unwrap()
}

#[test]
fn compiles_token_stream_to_ir() {
    let tree = parse(PROGRAM);

    assert_eq!(generate(&tree).unwrap(), EXPECTED_IR);
}

#[test]
fn compile_runs_the_whole_pipeline() {
    let stream = TokenStream::decode(PROGRAM, UnknownUnitPolicy::Reject).unwrap();

    assert_eq!(
        yalcc::compile(stream.symbols(), CodegenOptions::default()).unwrap(),
        EXPECTED_IR
    );
}

#[test]
fn parsing_is_deterministic() {
    let first = parse(PROGRAM);
    let second = parse(PROGRAM);

    assert_eq!(first, second);
    assert_eq!(render_plain(&first), render_plain(&second));
}

#[test]
fn frontier_reproduces_the_token_stream() {
    let stream = TokenStream::decode(PROGRAM, UnknownUnitPolicy::Reject).unwrap();
    let tree = Parser::parse_program(stream.symbols()).unwrap();

    // The trailing EOS marker is consumed by the parser but not recorded
    let symbols = &stream.symbols()[..stream.len() - 1];
    let leaves = tree.leaves().into_iter().cloned().collect::<Vec<_>>();

    assert_eq!(leaves, symbols);
}

#[test]
fn every_node_is_a_grammar_production() {
    fn check(tree: &ParseTree) {
        let ParseTree::Node { rule, children } = tree else {
            assert!(tree.is_leaf());
            return;
        };

        assert!(
            !matches!(rule, NonTerminal::Call | NonTerminal::CondB),
            "parser produced <{rule}>"
        );

        let arity = children.len();
        let allowed: &[usize] = match rule {
            NonTerminal::Program => &[5],
            NonTerminal::Code => &[0, 3],
            NonTerminal::Instruction | NonTerminal::Cond => &[1],
            NonTerminal::Assign => &[3],
            NonTerminal::If | NonTerminal::While => &[7],
            NonTerminal::Output | NonTerminal::Input => &[4],
            NonTerminal::ExprArith | NonTerminal::Prod | NonTerminal::D => &[2],
            NonTerminal::ExprArithPrime => &[0, 3],
            NonTerminal::ProdPrime => &[0, 2],
            NonTerminal::Atom => &[1, 2, 3],
            NonTerminal::C => &[1, 3],
            NonTerminal::CondA => &[2, 3],
            NonTerminal::Call | NonTerminal::CondB => &[],
        };

        assert!(allowed.contains(&arity), "<{rule}> with {arity} children");

        children.iter().for_each(check);
    }

    check(&parse(PROGRAM));
}

#[test]
fn annotations_name_source_lines() {
    let tree = parse(PROGRAM);
    let ir = CodeGenerator::new(CodegenOptions {
        annotate_source_lines: true,
    })
    .generate(&tree)
    .unwrap();

    let comments = ir
        .lines()
        .filter(|line| line.starts_with("  ; line"))
        .collect::<Vec<_>>();

    assert_eq!(
        comments,
        ["  ; line 2", "  ; line 3", "  ; line 4", "  ; line 4", "  ; line 5", "  ; line 5"]
    );
}

#[test]
fn syntax_errors_abort_compilation() {
    let text = indoc! {"
        line: 1 token: Prog lexical unit: PROG
        line: 1 token: P lexical unit: PROGNAME
        line: 1 token: Is lexical unit: IS
        line: 2 token: x lexical unit: VARNAME
        line: 2 token: 3 lexical unit: NUMBER
    "};
    let stream = TokenStream::decode(text, UnknownUnitPolicy::Reject).unwrap();

    let error = yalcc::compile(stream.symbols(), CodegenOptions::default()).unwrap_err();

    assert!(matches!(error, CompileError::Parse(_)));
    assert_eq!(
        error.to_string(),
        "syntax error: Expected ASSIGN but found NUMBER `3` at line 2"
    );
}

#[test]
fn lenient_policy_skips_unknown_units() {
    let text = indoc! {"
        token: Prog lexical unit: PROG
        token: P lexical unit: PROGNAME
        token: Is lexical unit: IS
        token: // lexical unit: COMMENT
        token: End lexical unit: END
    "};

    assert!(TokenStream::decode(text, UnknownUnitPolicy::Reject).is_err());

    let stream = TokenStream::decode(text, UnknownUnitPolicy::Skip).unwrap();
    let tree = Parser::parse_program(stream.symbols()).unwrap();

    assert_eq!(
        tree.leaves()
            .into_iter()
            .map(|symbol| symbol.kind)
            .collect::<Vec<_>>(),
        [
            LexicalUnit::Prog,
            LexicalUnit::ProgName,
            LexicalUnit::Is,
            LexicalUnit::End
        ]
    );
}

#[test]
fn exports_tree_as_latex() {
    let file = Temp::new_file().unwrap();
    let tree = parse(PROGRAM);

    latex::export(&tree, file.as_path()).unwrap();

    let document = std::fs::read_to_string(file.as_path()).unwrap();

    assert!(document.starts_with(r"\documentclass"));
    assert!(document.contains(r"\texttt{PROGNAME}: Gcd"));
    assert!(document.contains(r"$\varepsilon$"));
    assert_eq!(document, latex::to_latex(&tree));
}

#[test]
fn reads_token_files() {
    let file = Temp::new_file().unwrap();
    std::fs::write(file.as_path(), PROGRAM).unwrap();

    let stream = TokenStream::read(file.as_path(), UnknownUnitPolicy::Reject).unwrap();

    assert_eq!(stream.len(), 47);
    assert_eq!(stream.symbols()[1].value, "Gcd");
}

#[test]
fn compiles_programs_with_many_statements() {
    const STATEMENTS: usize = 100_000;

    let mut symbols = vec![
        Symbol::new(LexicalUnit::Prog, "Prog", SourceLine::known(1)),
        Symbol::new(LexicalUnit::ProgName, "Long", SourceLine::known(1)),
        Symbol::new(LexicalUnit::Is, "Is", SourceLine::known(1)),
    ];

    for line in 2..STATEMENTS + 2 {
        let line = SourceLine::known(line);

        symbols.extend([
            Symbol::new(LexicalUnit::VarName, "x", line),
            Symbol::new(LexicalUnit::Assign, ":=", line),
            Symbol::new(LexicalUnit::Number, "1", line),
            Symbol::new(LexicalUnit::Semi, ";", line),
        ]);
    }

    symbols.push(Symbol::new(
        LexicalUnit::End,
        "End",
        SourceLine::known(STATEMENTS + 2),
    ));

    let ir = yalcc::compile(&symbols, CodegenOptions::default()).unwrap();

    let stores = ir
        .lines()
        .filter(|line| line.trim_start().starts_with("store i32 1, i32* %1"))
        .count();

    assert_eq!(stores, STATEMENTS);
    assert_eq!(ir.matches("alloca").count(), 1);
}
