//! Register based IR in the shape of LLVM IR. Control structures are already
//! flattened to labels and branches; every value is an `i32` except
//! comparison results, which are `i1`.

use strum::{EnumIter, IntoEnumIterator};

use crate::index::{Index, simple_index};

simple_index! {
    /// Identifies a numbered virtual register (`%n`)
    pub struct RegisterId;
}

impl RegisterId {
    /// `%0` names the unlabeled entry block, values start at `%1`
    pub const FIRST: Self = Self(1);
}

simple_index! {
    /// Identifies a named block (`labelN`)
    pub struct LabelId;
}

impl LabelId {
    pub const ZERO: Self = Self(0);
}

/// Stack slot backing one source variable. It is the register holding the
/// slot's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageSlot(pub RegisterId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(RegisterId),
    /// Numeric literal, used verbatim
    Constant(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    LessOrEqual,
    Less,
}

/// Global format constants handed to `printf` and `scanf`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum FormatString {
    PrintInteger,
    ReadInteger,
}

impl FormatString {
    pub fn name(self) -> &'static str {
        match self {
            FormatString::PrintInteger => "@.str_int",
            FormatString::ReadInteger => "@.str_read",
        }
    }

    /// Encoded bytes, terminator included
    pub fn bytes(self) -> &'static str {
        match self {
            FormatString::PrintInteger => r"%d\0A\00",
            FormatString::ReadInteger => r"%d\00",
        }
    }

    pub fn len(self) -> usize {
        match self {
            FormatString::PrintInteger => 4,
            FormatString::ReadInteger => 3,
        }
    }

    fn array_type(self) -> String {
        format!("[{} x i8]", self.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Comment(String),
    Label(LabelId),
    Alloca {
        slot: StorageSlot,
    },
    Store {
        value: Operand,
        slot: StorageSlot,
    },
    Load {
        destination: RegisterId,
        slot: StorageSlot,
    },
    Arithmetic {
        operator: ArithmeticOperator,
        destination: RegisterId,
        lhs: Operand,
        rhs: Operand,
    },
    /// `0 - operand`
    Negate {
        destination: RegisterId,
        operand: Operand,
    },
    Compare {
        comparison: Comparison,
        destination: RegisterId,
        lhs: Operand,
        rhs: Operand,
    },
    /// Boolean negation of an `i1`
    Not {
        destination: RegisterId,
        operand: RegisterId,
    },
    Branch {
        condition: RegisterId,
        positive: LabelId,
        negative: LabelId,
    },
    Jump {
        destination: LabelId,
    },
    FormatPointer {
        destination: RegisterId,
        format: FormatString,
    },
    Print {
        destination: RegisterId,
        format: RegisterId,
        value: RegisterId,
    },
    Read {
        destination: RegisterId,
        format: RegisterId,
        slot: StorageSlot,
    },
    Return {
        value: Operand,
    },
}

impl Instruction {
    /// Register defined by this instruction, if any
    pub fn destination(&self) -> Option<RegisterId> {
        match self {
            Instruction::Alloca { slot } => Some(slot.0),
            Instruction::Load { destination, .. }
            | Instruction::Arithmetic { destination, .. }
            | Instruction::Negate { destination, .. }
            | Instruction::Compare { destination, .. }
            | Instruction::Not { destination, .. }
            | Instruction::FormatPointer { destination, .. }
            | Instruction::Print { destination, .. }
            | Instruction::Read { destination, .. } => Some(*destination),
            Instruction::Comment(_)
            | Instruction::Label(_)
            | Instruction::Store { .. }
            | Instruction::Branch { .. }
            | Instruction::Jump { .. }
            | Instruction::Return { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub symbol_name: String,
    pub instructions: Vec<Instruction>,
}

impl FunctionDefinition {
    pub fn labels(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.instructions.iter().filter_map(|instruction| match instruction {
            Instruction::Label(label) => Some(*label),
            _ => None,
        })
    }

    pub fn defined_registers(&self) -> impl Iterator<Item = RegisterId> + '_ {
        self.instructions.iter().filter_map(Instruction::destination)
    }
}

/// A whole program: the I/O prelude plus a single `main`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub main: FunctionDefinition,
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "; Declare external functions for I/O")?;
        writeln!(f, "declare i32 @printf(i8*, ...)")?;
        writeln!(f, "declare i32 @scanf(i8*, ...)")?;
        writeln!(f)?;

        writeln!(f, "; Format strings")?;
        for format in FormatString::iter() {
            writeln!(
                f,
                "{} = private unnamed_addr constant {} c\"{}\", align 1",
                format.name(),
                format.array_type(),
                format.bytes()
            )?;
        }
        writeln!(f)?;

        write!(f, "{}", self.main)
    }
}

impl core::fmt::Display for FunctionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "define i32 @{}() {{", self.symbol_name)?;

        for instruction in &self.instructions {
            match instruction {
                Instruction::Label(_) => writeln!(f, "{instruction}")?,
                _ => writeln!(f, "  {instruction}")?,
            }
        }

        writeln!(f, "}}")
    }
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Comment(text) => write!(f, "; {text}"),
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Alloca { slot } => write!(f, "{} = alloca i32, align 4", slot.0),
            Instruction::Store { value, slot } => {
                write!(f, "store i32 {value}, i32* {}, align 4", slot.0)
            }
            Instruction::Load { destination, slot } => {
                write!(f, "{destination} = load i32, i32* {}, align 4", slot.0)
            }
            Instruction::Arithmetic {
                operator,
                destination,
                lhs,
                rhs,
            } => write!(f, "{destination} = {operator} i32 {lhs}, {rhs}"),
            Instruction::Negate {
                destination,
                operand,
            } => write!(f, "{destination} = sub nsw i32 0, {operand}"),
            Instruction::Compare {
                comparison,
                destination,
                lhs,
                rhs,
            } => write!(f, "{destination} = icmp {comparison} i32 {lhs}, {rhs}"),
            Instruction::Not {
                destination,
                operand,
            } => write!(f, "{destination} = xor i1 {operand}, true"),
            Instruction::Branch {
                condition,
                positive,
                negative,
            } => write!(
                f,
                "br i1 {condition}, label %{positive}, label %{negative}"
            ),
            Instruction::Jump { destination } => write!(f, "br label %{destination}"),
            Instruction::FormatPointer {
                destination,
                format,
            } => write!(
                f,
                "{destination} = getelementptr inbounds {ty}, {ty}* {}, i32 0, i32 0",
                format.name(),
                ty = format.array_type()
            ),
            Instruction::Print {
                destination,
                format,
                value,
            } => write!(
                f,
                "{destination} = call i32 (i8*, ...) @printf(i8* {format}, i32 {value})"
            ),
            Instruction::Read {
                destination,
                format,
                slot,
            } => write!(
                f,
                "{destination} = call i32 (i8*, ...) @scanf(i8* {format}, i32* {})",
                slot.0
            ),
            Instruction::Return { value } => write!(f, "ret i32 {value}"),
        }
    }
}

impl core::fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArithmeticOperator::Add => "add nsw",
            ArithmeticOperator::Subtract => "sub nsw",
            ArithmeticOperator::Multiply => "mul nsw",
            ArithmeticOperator::Divide => "sdiv",
        })
    }
}

impl core::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Comparison::Equal => "eq",
            Comparison::LessOrEqual => "sle",
            Comparison::Less => "slt",
        })
    }
}

impl core::fmt::Display for RegisterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.index())
    }
}

impl core::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "label{}", self.index())
    }
}

impl core::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(register_id) => write!(f, "{register_id}"),
            Operand::Constant(value) => f.write_str(value),
        }
    }
}
