use arch::{Addr, Inst, Operand, Reg};

use super::{registry::SLOT, CodeGen};
use crate::{
    error::Error,
    grammer::ast::{self, BinOp, Type},
};

impl CodeGen {
    pub(super) fn var_decl(&mut self, decl: &ast::VarDecl) -> Result<(), Error> {
        self.check_value(&decl.name, &decl.ty, &decl.value)?;

        // Same-typed aggregate: copy it slot by slot
        if let ast::Operand::Var(src) = &decl.value {
            let sym = self.lookup(src)?;
            if sym.ty == decl.ty && self.state.registry.is_aggregate(&sym.ty) {
                let slots = self.state.registry.sizeof(&sym.ty)? / SLOT;
                let offset = self.alloc(&decl.name, decl.ty.clone())?;
                for i in 0..slots {
                    let from = Addr::frame(sym.offset + i * SLOT);
                    self.emit(Inst::MOV(Reg::RAX.into(), from.into()));
                    self.emit(Inst::MOV(Addr::frame(offset + i * SLOT).into(), Reg::RAX.into()));
                }
                return Ok(());
            }
        }

        let value = self.value(&decl.value)?;
        let offset = self.alloc(&decl.name, decl.ty.clone())?;
        self.emit(Inst::MOV(Addr::frame(offset).into(), value));
        Ok(())
    }

    pub(super) fn str_decl(&mut self, decl: &ast::StrDecl) -> Result<(), Error> {
        let label = self.sections.intern(&decl.value);
        let offset = self.alloc(&decl.name, Type::Bytes)?;
        self.emit(Inst::LEA(Reg::RAX, Addr::Rip(label)));
        self.emit(Inst::MOV(Addr::frame(offset).into(), Reg::RAX.into()));
        Ok(())
    }

    pub(super) fn struct_init(&mut self, init: &ast::StructInit) -> Result<(), Error> {
        let fields = self.state.registry.fields(&init.ty)?.to_vec();
        for (name, value) in &init.fields {
            let field = fields
                .iter()
                .find(|f| f.name == *name)
                .ok_or_else(|| Error::UnknownField(init.ty.clone(), name.clone()))?;
            self.check_value(name, &field.ty, value)?;
        }

        let offset = self.alloc(&init.name, Type::Named(init.ty.clone()))?;
        for (i, field) in fields.iter().enumerate() {
            let value = match init.fields.iter().find(|(name, _)| *name == field.name) {
                Some((_, value)) => self.value(value)?,
                None => Operand::Imm(0),
            };
            self.emit(Inst::MOV(Addr::frame(offset + i * SLOT).into(), value));
        }
        Ok(())
    }

    pub(super) fn array_init(&mut self, init: &ast::ArrayInit) -> Result<(), Error> {
        if init.values.len() != init.len {
            return Err(Error::ArrayLength {
                name: init.name.clone(),
                expected: init.len,
                found: init.values.len(),
            });
        }
        for value in &init.values {
            self.check_value(&init.name, &init.elem, value)?;
        }

        let ty = Type::Array(Box::new(init.elem.clone()), init.len);
        let offset = self.alloc(&init.name, ty)?;
        for (i, value) in init.values.iter().enumerate() {
            let value = self.value(value)?;
            self.emit(Inst::MOV(Addr::frame(offset + i * SLOT).into(), value));
        }
        Ok(())
    }

    pub(super) fn array_access(&mut self, access: &ast::ArrayAccess) -> Result<(), Error> {
        let elem = ast::Operand::Index(access.array.clone(), access.index);
        self.load(Reg::RAX, &elem)?;
        let offset = self.alloc(&access.name, access.ty.clone())?;
        self.emit(Inst::MOV(Addr::frame(offset).into(), Reg::RAX.into()));
        Ok(())
    }

    pub(super) fn address_of(&mut self, addr: &ast::AddressOf) -> Result<(), Error> {
        let target = self.lookup(&addr.target)?;
        self.emit(Inst::LEA(Reg::RAX, Addr::frame(target.offset)));
        let offset = self.alloc(&addr.name, addr.ty.clone())?;
        self.emit(Inst::MOV(Addr::frame(offset).into(), Reg::RAX.into()));
        Ok(())
    }

    pub(super) fn deref(&mut self, deref: &ast::Deref) -> Result<(), Error> {
        let ptr = ast::Operand::Deref(deref.ptr.clone(), deref.index);
        let (src, _) = self.place(&ptr)?;
        self.emit(Inst::MOV(Reg::RAX.into(), src.into()));
        let offset = self.alloc(&deref.name, deref.ty.clone())?;
        self.emit(Inst::MOV(Addr::frame(offset).into(), Reg::RAX.into()));
        Ok(())
    }

    pub(super) fn elem_assign(&mut self, assign: &ast::ElemAssign) -> Result<(), Error> {
        let elem = ast::Operand::Index(assign.array.clone(), assign.index);
        let (dst, ty) = self.place(&elem)?;
        self.check_value(&assign.array, &ty, &assign.value)?;
        let value = self.value(&assign.value)?;
        self.emit(Inst::MOV(dst.into(), value));
        Ok(())
    }

    pub(super) fn binop(&mut self, binop: &ast::BinOpAssign) -> Result<(), Error> {
        self.frame()?;
        self.load(Reg::RCX, &binop.rhs)?;
        self.load(Reg::RAX, &binop.lhs)?;

        let (rax, rcx) = (Operand::Reg(Reg::RAX), Operand::Reg(Reg::RCX));
        let mut result = Reg::RAX;
        match binop.op {
            BinOp::Add => self.emit(Inst::ADD(rax, rcx)),
            BinOp::Sub => self.emit(Inst::SUB(rax, rcx)),
            BinOp::Mul => self.emit(Inst::IMUL(Reg::RAX, rcx)),
            BinOp::Div | BinOp::Mod => {
                self.emit(Inst::CQO());
                self.emit(Inst::IDIV(rcx));
                if binop.op == BinOp::Mod {
                    result = Reg::RDX;
                }
            }
            BinOp::And => self.emit(Inst::AND(rax, rcx)),
            BinOp::Or => self.emit(Inst::OR(rax, rcx)),
            BinOp::Xor => self.emit(Inst::XOR(rax, rcx)),
            BinOp::Shl => self.emit(Inst::SHL(rax, Reg::CL)),
            BinOp::Shr => self.emit(Inst::SHR(rax, Reg::CL)),
        }

        let ty = binop.ty.clone().unwrap_or(Type::Int);
        let offset = self.slot_or_alloc(&binop.dst, ty)?;
        self.emit(Inst::MOV(Addr::frame(offset).into(), result.into()));
        Ok(())
    }

    pub(super) fn cmp(&mut self, cmp: &ast::Cmp) -> Result<(), Error> {
        self.frame()?;
        self.load(Reg::RCX, &cmp.rhs)?;
        let lhs: Operand = match &cmp.lhs {
            ast::Operand::Var(name) => {
                let sym = self.lookup(name)?;
                if self.state.registry.is_aggregate(&sym.ty) {
                    self.emit(Inst::LEA(Reg::RAX, Addr::frame(sym.offset)));
                    Reg::RAX.into()
                } else {
                    Addr::frame(sym.offset).into()
                }
            }
            lhs => {
                self.load(Reg::RAX, lhs)?;
                Reg::RAX.into()
            }
        };
        self.emit(Inst::CMP(lhs, Reg::RCX.into()));
        Ok(())
    }
}
