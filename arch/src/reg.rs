use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Reg {
    RAX,
    RBX,
    RCX,
    RDX,
    RSI,
    RDI,
    RBP,
    RSP,
    R8,
    R9,
    R10,
    R11,

    // Sub registers
    EAX,
    CL,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lowercase() {
        assert_eq!(Reg::RAX.to_string(), "rax");
        assert_eq!(Reg::R11.to_string(), "r11");
        assert_eq!(Reg::CL.to_string(), "cl");
    }

    #[test]
    fn parse_lowercase() {
        assert_eq!("rdi".parse::<Reg>(), Ok(Reg::RDI));
        assert!("hoge".parse::<Reg>().is_err());
    }
}
