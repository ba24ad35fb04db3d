use arch::{Inst, Line, Operand, Reg, Target};
use indexmap::{IndexMap, IndexSet};

use super::frame::FramePatch;

/// Data and text sections, filled in source order.
#[derive(Debug, Default)]
pub struct Sections {
    data: Vec<Line>,
    text: Vec<Line>,
    strings: IndexMap<String, String>, // literal -> label
    externs: IndexSet<String>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&mut self, line: impl Into<Line>) {
        self.data.push(line.into());
    }

    pub fn emit(&mut self, line: impl Into<Line>) {
        self.text.push(line.into());
    }

    /// Read-only copy of a string literal; equal literals share a label.
    pub fn intern(&mut self, value: &str) -> String {
        if let Some(label) = self.strings.get(value) {
            return label.clone();
        }
        let label = format!(".LC{}", self.strings.len());
        self.data(Line::directive(".section .rodata"));
        self.data(Line::label(&label));
        self.data(Line::directive(format!(".asciz \"{}\"", value)));
        self.strings.insert(value.to_string(), label.clone());
        label
    }

    /// `.extern` once per symbol.
    pub fn declare_extern(&mut self, name: &str) {
        if self.externs.insert(name.to_string()) {
            self.emit(Line::directive(format!(".extern {}", name)));
        }
    }

    /// Emit `sub rsp, 0` to be rewritten once the frame size is known.
    pub fn placeholder(&mut self) -> FramePatch {
        let patch = FramePatch::new(self.text.len());
        self.emit(Inst::SUB(Reg::RSP.into(), Operand::Imm(0)));
        patch
    }

    pub fn apply(&mut self, patch: FramePatch, size: usize) {
        self.text[patch.index()] = Inst::SUB(Reg::RSP.into(), Operand::Imm(size as i64)).into();
    }

    pub fn text(&self) -> &[Line] {
        &self.text
    }

    /// Whole file: syntax header, target boilerplate, data, then text.
    pub fn listing(&self, target: Target) -> Vec<Line> {
        let mut lines = vec![Line::directive(".intel_syntax noprefix")];
        lines.extend(target.boilerplate().iter().map(|s| Line::directive(*s)));
        lines.extend(self.data.iter().cloned());
        lines.push(Line::directive(""));
        lines.extend(self.text.iter().cloned());
        lines
    }

    pub fn finalize(&self, target: Target) -> String {
        let mut asm = String::new();
        for line in self.listing(target) {
            asm.push_str(&line.to_string());
            asm.push('\n');
        }
        asm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_interned_once() {
        let mut sections = Sections::new();
        assert_eq!(sections.intern("hi"), ".LC0");
        assert_eq!(sections.intern("there"), ".LC1");
        assert_eq!(sections.intern("hi"), ".LC0");
        assert_eq!(sections.data.len(), 6);
    }

    #[test]
    fn placeholder_is_patched() {
        let mut sections = Sections::new();
        sections.emit(Inst::PUSH(Reg::RBP.into()));
        let patch = sections.placeholder();
        sections.apply(patch, 128);
        assert_eq!(sections.text()[1].to_string(), "    sub rsp, 128");
    }

    #[test]
    fn externs_deduplicated() {
        let mut sections = Sections::new();
        sections.declare_extern("puts");
        sections.declare_extern("puts");
        assert_eq!(sections.text().len(), 1);
    }

    #[test]
    fn linux_boilerplate_precedes_data() {
        let mut sections = Sections::new();
        sections.intern("x");
        let asm = sections.finalize(Target::Linux);
        let stack = asm.find("GNU-stack").unwrap();
        let rodata = asm.find(".rodata").unwrap();
        assert!(asm.starts_with(".intel_syntax noprefix\n"));
        assert!(stack < rodata);
        assert!(!sections.finalize(Target::Win64).contains("GNU"));
    }
}
