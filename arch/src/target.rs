use crate::reg::Reg;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Calling convention the generated assembly follows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Target {
    /// System V AMD64
    #[default]
    Linux,
    /// Microsoft x64
    Win64,
}

impl Target {
    /// Integer argument registers in order.
    pub fn param_regs(self) -> &'static [Reg] {
        match self {
            Target::Linux => &[Reg::RDI, Reg::RSI, Reg::RDX, Reg::RCX, Reg::R8, Reg::R9],
            Target::Win64 => &[Reg::RCX, Reg::RDX, Reg::R8, Reg::R9],
        }
    }

    /// Bytes the caller reserves above the return address for the callee.
    pub fn shadow_space(self) -> usize {
        match self {
            Target::Linux => 0,
            Target::Win64 => 32,
        }
    }

    /// Whether excess call arguments may be passed on the stack.
    pub fn spills_args(self) -> bool {
        matches!(self, Target::Win64)
    }

    /// Section directives emitted right after the syntax directive.
    pub fn boilerplate(self) -> &'static [&'static str] {
        match self {
            Target::Linux => &[
                ".section .note.GNU-stack,\"\",@progbits",
                ".section .note.gnu.property,\"a\"",
                ".align 8",
                ".long 4",
                ".long 16",
                ".long 5",
                ".string \"GNU\"",
                ".long 0xc0000002",
                ".long 4",
                ".long 3",
                ".align 8",
            ],
            Target::Win64 => &[],
        }
    }

    /// File name suffix of a linked executable.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Target::Linux => "",
            Target::Win64 => ".exe",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("linux".parse::<Target>().unwrap(), Target::Linux);
        assert_eq!("win64".parse::<Target>().unwrap(), Target::Win64);
        assert!("macos".parse::<Target>().is_err());
        assert_eq!(Target::Win64.to_string(), "win64");
    }

    #[test]
    fn abi_tables() {
        assert_eq!(Target::Linux.param_regs().len(), 6);
        assert_eq!(Target::Win64.param_regs()[0], Reg::RCX);
        assert_eq!(Target::Linux.shadow_space(), 0);
        assert_eq!(Target::Win64.shadow_space(), 32);
        assert!(Target::Win64.boilerplate().is_empty());
        assert!(Target::Linux.boilerplate()[0].contains("GNU-stack"));
    }
}
