use crate::reg::Reg;
use color_print::cformat;
use std::fmt;
use strum::{Display, EnumString};

// ----------------------------------------------------------------------------
// Addressing

/// Memory address expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    Base(Reg, i64), // [reg +/- disp]
    Rip(String),    // [rip + label]
}

impl Addr {
    /// Slot at `rbp - offset`.
    pub fn frame(offset: usize) -> Self {
        Addr::Base(Reg::RBP, -(offset as i64))
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Base(reg, 0) => write!(f, "[{}]", reg),
            Addr::Base(reg, disp) if *disp < 0 => write!(f, "[{} - {}]", reg, -disp),
            Addr::Base(reg, disp) => write!(f, "[{} + {}]", reg, disp),
            Addr::Rip(label) => write!(f, "[rip + {}]", label),
        }
    }
}

// ----------------------------------------------------------------------------
// Operand

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(i64),
    Mem(Addr),
}

impl Operand {
    /// Immediates wider than a sign-extended 32-bit value must go through a register.
    pub fn fits_imm32(value: i64) -> bool {
        i32::try_from(value).is_ok()
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<i64> for Operand {
    fn from(imm: i64) -> Self {
        Operand::Imm(imm)
    }
}

impl From<Addr> for Operand {
    fn from(addr: Addr) -> Self {
        Operand::Mem(addr)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Imm(imm) => write!(f, "{}", imm),
            Operand::Mem(addr) => write!(f, "QWORD PTR {}", addr),
        }
    }
}

// ----------------------------------------------------------------------------
// Jump

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Jump {
    JMP,
    JE,
    JNE,
    JG,
    JGE,
    JL,
    JLE,
}

// ----------------------------------------------------------------------------
// Instruction

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    PUSH(Operand),
    POP(Operand),
    MOV(Operand, Operand),
    LEA(Reg, Addr),

    ADD(Operand, Operand),
    SUB(Operand, Operand),
    IMUL(Reg, Operand),
    CQO(),
    IDIV(Operand),
    AND(Operand, Operand),
    OR(Operand, Operand),
    XOR(Operand, Operand),
    SHL(Operand, Reg),
    SHR(Operand, Reg),

    CMP(Operand, Operand),
    JUMP(Jump, String),
    CALL(String),
    RET(),
}

impl Inst {
    fn parts(&self) -> (String, String) {
        let two = |a: &dyn fmt::Display, b: &dyn fmt::Display| format!("{}, {}", a, b);
        match self {
            Inst::PUSH(src) => ("push".into(), src.to_string()),
            Inst::POP(dst) => ("pop".into(), dst.to_string()),
            Inst::MOV(dst, src) => ("mov".into(), two(dst, src)),
            Inst::LEA(dst, addr) => ("lea".into(), two(dst, addr)),
            Inst::ADD(dst, src) => ("add".into(), two(dst, src)),
            Inst::SUB(dst, src) => ("sub".into(), two(dst, src)),
            Inst::IMUL(dst, src) => ("imul".into(), two(dst, src)),
            Inst::CQO() => ("cqo".into(), String::new()),
            Inst::IDIV(src) => ("idiv".into(), src.to_string()),
            Inst::AND(dst, src) => ("and".into(), two(dst, src)),
            Inst::OR(dst, src) => ("or".into(), two(dst, src)),
            Inst::XOR(dst, src) => ("xor".into(), two(dst, src)),
            Inst::SHL(dst, count) => ("shl".into(), two(dst, count)),
            Inst::SHR(dst, count) => ("shr".into(), two(dst, count)),
            Inst::CMP(lhs, rhs) => ("cmp".into(), two(lhs, rhs)),
            Inst::JUMP(jump, label) => (jump.to_string(), label.clone()),
            Inst::CALL(func) => ("call".into(), func.clone()),
            Inst::RET() => ("ret".into(), String::new()),
        }
    }

    pub fn cformat(&self) -> String {
        let (name, args) = self.parts();
        cformat!("<r>{:<6}</><b>{}</>", name, args)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            (name, args) if args.is_empty() => write!(f, "{}", name),
            (name, args) => write!(f, "{} {}", name, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_inst {
        ($($name:ident: $inst:expr => $text:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!($inst.to_string(), $text);
                }
            )*
        }
    }

    test_inst! {
        test_push_rbp: Inst::PUSH(Reg::RBP.into()) => "push rbp",
        test_mov_frame: Inst::MOV(Addr::frame(16).into(), Reg::RDI.into()) => "mov QWORD PTR [rbp - 16], rdi",
        test_mov_imm: Inst::MOV(Reg::RAX.into(), Operand::Imm(-3)) => "mov rax, -3",
        test_lea_rip: Inst::LEA(Reg::RDI, Addr::Rip(".LC0".into())) => "lea rdi, [rip + .LC0]",
        test_lea_base: Inst::LEA(Reg::RAX, Addr::Base(Reg::R11, 0)) => "lea rax, [r11]",
        test_load_deref: Inst::MOV(Reg::RAX.into(), Addr::Base(Reg::R11, 16).into()) => "mov rax, QWORD PTR [r11 + 16]",
        test_sub_rsp: Inst::SUB(Reg::RSP.into(), Operand::Imm(64)) => "sub rsp, 64",
        test_imul: Inst::IMUL(Reg::RAX, Reg::RCX.into()) => "imul rax, rcx",
        test_cqo: Inst::CQO() => "cqo",
        test_shl: Inst::SHL(Reg::RAX.into(), Reg::CL) => "shl rax, cl",
        test_xor_eax: Inst::XOR(Reg::EAX.into(), Reg::EAX.into()) => "xor eax, eax",
        test_jge: Inst::JUMP(Jump::JGE, ".end".into()) => "jge .end",
        test_call: Inst::CALL("printf".into()) => "call printf",
        test_ret: Inst::RET() => "ret",
    }

    #[test]
    fn imm32_range() {
        assert!(Operand::fits_imm32(i32::MAX as i64));
        assert!(Operand::fits_imm32(i32::MIN as i64));
        assert!(!Operand::fits_imm32(i32::MAX as i64 + 1));
    }

    #[test]
    fn jump_mnemonics() {
        assert_eq!("jle".parse::<Jump>().unwrap(), Jump::JLE);
        assert!("jz".parse::<Jump>().is_err());
    }
}
