use crate::inst::Inst;
use color_print::cformat;
use std::fmt;

/// One line of the emitted assembly file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Directive(String),
    Label(String),
    Inst(Inst),
}

impl Line {
    pub fn directive(text: impl Into<String>) -> Self {
        Line::Directive(text.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Line::Label(name.into())
    }

    pub fn cformat(&self) -> String {
        match self {
            Line::Directive(text) => cformat!("<c>{}</>", text),
            Line::Label(name) => cformat!("<g>{}:</>", name),
            Line::Inst(inst) => format!("    {}", inst.cformat()),
        }
    }
}

impl From<Inst> for Line {
    fn from(inst: Inst) -> Self {
        Line::Inst(inst)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Directive(text) => write!(f, "{}", text),
            Line::Label(name) => write!(f, "{}:", name),
            Line::Inst(inst) => write!(f, "    {}", inst),
        }
    }
}
