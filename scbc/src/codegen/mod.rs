mod call;
mod decl;
mod frame;
mod registry;
mod section;
mod value;

pub use frame::{Frame, FramePatch, Symbol, FRAME_ALIGN};
pub use registry::{Registry, SLOT};
pub use section::Sections;

use crate::{
    error::Error,
    grammer::ast::{self, Ast, Node, Type},
};
use arch::{Addr, Inst, Line, Operand, Reg, Target};

/// Support-library symbols declared by `use runtime;`.
pub const RUNTIME_SYMBOLS: [&str; 7] = [
    "open",
    "write",
    "close",
    "allocate",
    "deallocate",
    "starts_with",
    "ends_with",
];

/// Everything the generator mutates while walking the AST.
#[derive(Debug, Default)]
pub struct CompilationState {
    pub registry: Registry,
    pub frame: Option<Frame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub asm: String,
    pub listing: Vec<Line>,
    /// The program asked for the support runtime.
    pub runtime: bool,
}

pub struct CodeGen {
    target: Target,
    state: CompilationState,
    sections: Sections,
    runtime: bool,
}

impl CodeGen {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            state: CompilationState::default(),
            sections: Sections::new(),
            runtime: false,
        }
    }

    pub fn generate(mut self, ast: &Ast) -> Result<Output, Error> {
        for (row, node) in &ast.0 {
            self.node(node).map_err(|e| e.at(*row))?;
        }
        self.close_function();
        Ok(Output {
            asm: self.sections.finalize(self.target),
            listing: self.sections.listing(self.target),
            runtime: self.runtime,
        })
    }

    fn node(&mut self, node: &Node) -> Result<(), Error> {
        match node {
            Node::StructDef(def) => self.state.registry.define_struct(def),
            Node::EnumDef(def) => self.state.registry.define_enum(def),
            Node::Extern(name) => {
                self.sections.declare_extern(name);
                Ok(())
            }
            Node::UseRuntime => {
                for name in RUNTIME_SYMBOLS {
                    self.sections.declare_extern(name);
                }
                self.runtime = true;
                Ok(())
            }
            Node::DataDef(def) => {
                self.sections.data(Line::directive(".data"));
                self.sections.data(Line::directive(format!(".globl {}", def.name)));
                self.sections.data(Line::label(&def.name));
                self.sections.data(Line::directive(format!(".asciz \"{}\"", def.value)));
                Ok(())
            }
            Node::BssDef(def) => {
                self.sections.data(Line::directive(".bss"));
                self.sections.data(Line::directive(".align 32"));
                self.sections.data(Line::directive(format!(".globl {}", def.name)));
                self.sections.data(Line::label(&def.name));
                self.sections.data(Line::directive(format!(".zero {}", def.size)));
                Ok(())
            }
            Node::FuncDef(def) => self.funcdef(def),
            Node::Ret(ret) => self.ret(ret),
            Node::Call(call) => self.call(call),
            Node::CallAssign(assign) => self.call_assign(assign),
            Node::VarDecl(decl) => self.var_decl(decl),
            Node::StrDecl(decl) => self.str_decl(decl),
            Node::StructInit(init) => self.struct_init(init),
            Node::ArrayInit(init) => self.array_init(init),
            Node::ArrayAccess(access) => self.array_access(access),
            Node::AddressOf(addr) => self.address_of(addr),
            Node::Deref(deref) => self.deref(deref),
            Node::BinOp(binop) => self.binop(binop),
            Node::ElemAssign(assign) => self.elem_assign(assign),
            Node::Cmp(cmp) => self.cmp(cmp),
            Node::Jump(branch) => {
                self.frame()?;
                self.emit(Inst::JUMP(branch.jump, format!(".{}", branch.label)));
                Ok(())
            }
            Node::Label(name) => {
                self.frame()?;
                self.sections.emit(Line::label(format!(".{}", name)));
                Ok(())
            }
            Node::Push(value) => self.push(value),
            Node::Pop(name) => {
                let offset = self.alloc(name, Type::Int)?;
                self.emit(Inst::POP(Addr::frame(offset).into()));
                Ok(())
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Frame lifecycle

impl CodeGen {
    fn emit(&mut self, inst: Inst) {
        self.sections.emit(inst);
    }

    fn frame(&self) -> Result<&Frame, Error> {
        self.state.frame.as_ref().ok_or(Error::OutsideFunction)
    }

    fn frame_mut(&mut self) -> Result<&mut Frame, Error> {
        self.state.frame.as_mut().ok_or(Error::OutsideFunction)
    }

    /// Fresh slot sized for `ty`.
    fn alloc(&mut self, name: &str, ty: Type) -> Result<usize, Error> {
        let size = self.state.registry.sizeof(&ty)?;
        self.frame_mut()?.alloc(name, ty, size)
    }

    /// Existing slot of `name`, or a fresh one of type `ty`.
    fn slot_or_alloc(&mut self, name: &str, ty: Type) -> Result<usize, Error> {
        if self.frame()?.contains(name) {
            return Ok(self.frame()?.lookup(name)?.offset);
        }
        self.alloc(name, ty)
    }

    fn lookup(&self, name: &str) -> Result<Symbol, Error> {
        self.frame()?.lookup(name).cloned()
    }

    /// Patch the previous function's prologue if no `ret` did.
    fn close_function(&mut self) {
        if let Some(mut frame) = self.state.frame.take() {
            if let Some(patch) = frame.take_patch() {
                self.sections.apply(patch, frame.size());
            }
        }
    }

    fn funcdef(&mut self, def: &ast::FuncDef) -> Result<(), Error> {
        self.close_function();

        let regs = self.target.param_regs();
        if def.params.len() > regs.len() && !self.target.spills_args() {
            return Err(Error::TooManyArguments {
                func: def.name.clone(),
                count: def.params.len(),
                max: regs.len(),
                target: self.target.to_string(),
            });
        }

        // Prologue
        self.sections.emit(Line::directive(".text"));
        self.sections.emit(Line::directive(format!(".globl {}", def.name)));
        self.sections.emit(Line::label(&def.name));
        self.emit(Inst::PUSH(Reg::RBP.into()));
        self.emit(Inst::MOV(Reg::RBP.into(), Reg::RSP.into()));
        let patch = self.sections.placeholder();
        self.state.frame = Some(Frame::open(self.target.shadow_space(), patch));

        // Parameters: one slot each
        for (idx, param) in def.params.iter().enumerate() {
            // Structs arrive by address
            let ty = match &param.ty {
                Type::Named(name) if self.state.registry.is_struct(name) => {
                    Type::Ptr(Box::new(param.ty.clone()))
                }
                ty => ty.clone(),
            };
            let offset = self.frame_mut()?.alloc(&param.name, ty, SLOT)?;
            match regs.get(idx) {
                Some(reg) => self.emit(Inst::MOV(Addr::frame(offset).into(), (*reg).into())),
                None => {
                    // Caller's stack: return address, saved rbp, shadow space
                    let disp = 16 + self.target.shadow_space() + SLOT * (idx - regs.len());
                    let src = Addr::Base(Reg::RBP, disp as i64);
                    self.emit(Inst::MOV(Reg::RAX.into(), src.into()));
                    self.emit(Inst::MOV(Addr::frame(offset).into(), Reg::RAX.into()));
                }
            }
        }

        if self.target == Target::Win64 && def.name == "main" {
            let argv = Type::Ptr(Box::new(Type::Bytes));
            for (name, reg, ty) in [("argc", Reg::RCX, Type::Int), ("argv", Reg::RDX, argv)] {
                if !self.frame()?.contains(name) {
                    let offset = self.frame_mut()?.alloc(name, ty, SLOT)?;
                    self.emit(Inst::MOV(Addr::frame(offset).into(), reg.into()));
                }
            }
        }
        Ok(())
    }

    fn ret(&mut self, ret: &ast::Ret) -> Result<(), Error> {
        let frame = self.state.frame.as_mut().ok_or(Error::OutsideFunction)?;
        if let Some(patch) = frame.take_patch() {
            let size = frame.size();
            self.sections.apply(patch, size);
        }
        if let Some(value) = &ret.value {
            self.load(Reg::RAX, value)?;
        }
        self.emit(Inst::MOV(Reg::RSP.into(), Reg::RBP.into()));
        self.emit(Inst::POP(Reg::RBP.into()));
        self.emit(Inst::RET());
        Ok(())
    }

    fn push(&mut self, value: &ast::Operand) -> Result<(), Error> {
        self.frame()?;
        let src = match value {
            ast::Operand::Int(v) if Operand::fits_imm32(*v) => Operand::Imm(*v),
            ast::Operand::Var(name) => {
                let sym = self.lookup(name)?;
                if self.state.registry.is_aggregate(&sym.ty) {
                    self.emit(Inst::LEA(Reg::RAX, Addr::frame(sym.offset)));
                    Reg::RAX.into()
                } else {
                    Addr::frame(sym.offset).into()
                }
            }
            value => {
                self.load(Reg::RAX, value)?;
                Reg::RAX.into()
            }
        };
        self.emit(Inst::PUSH(src));
        Ok(())
    }
}
