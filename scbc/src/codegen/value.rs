use arch::{Addr, Inst, Operand, Reg};

use super::{registry::SLOT, CodeGen};
use crate::{
    error::Error,
    grammer::ast::{self, Type},
};

impl CodeGen {
    /// Address and type of a memory operand.
    pub(super) fn place(&mut self, operand: &ast::Operand) -> Result<(Addr, Type), Error> {
        match operand {
            ast::Operand::Var(name) => {
                let sym = self.lookup(name)?;
                Ok((Addr::frame(sym.offset), sym.ty))
            }
            ast::Operand::Field(name, chain) => {
                let sym = self.lookup(name)?;
                let (mut addr, mut ty) = (Addr::frame(sym.offset), sym.ty);
                for field in chain {
                    let (owner, indirect) = match ty {
                        Type::Ptr(inner) => (*inner, true),
                        ty => (ty, false),
                    };
                    let (offset, field_ty) = self.state.registry.field(&owner, field)?;
                    if indirect {
                        // The slot holds the struct's base address
                        self.emit(Inst::MOV(Reg::R11.into(), addr.into()));
                        addr = Addr::Base(Reg::R11, 0);
                    }
                    addr = below(addr, offset);
                    ty = match field_ty {
                        Type::Named(inner) if self.state.registry.is_struct(&inner) => {
                            Type::Ptr(Box::new(Type::Named(inner)))
                        }
                        field_ty => field_ty,
                    };
                }
                Ok((addr, ty))
            }
            ast::Operand::Index(name, index) => {
                let sym = self.lookup(name)?;
                let Type::Array(elem, len) = sym.ty else {
                    return Err(Error::NotAnArray(name.clone()));
                };
                if *index >= len {
                    return Err(Error::IndexOutOfBounds {
                        name: name.clone(),
                        index: *index,
                        len,
                    });
                }
                Ok((Addr::frame(sym.offset + index * SLOT), *elem))
            }
            ast::Operand::Deref(name, index) => {
                let sym = self.lookup(name)?;
                let ty = match sym.ty {
                    Type::Ptr(inner) => *inner,
                    _ => Type::Int,
                };
                let src = Addr::frame(sym.offset);
                self.emit(Inst::MOV(Reg::R11.into(), src.into()));
                let index = index.unwrap_or(0);
                let disp = index
                    .checked_mul(SLOT)
                    .and_then(|disp| i32::try_from(disp).ok())
                    .ok_or_else(|| Error::OffsetOverflow {
                        name: name.clone(),
                        index,
                    })?;
                Ok((Addr::Base(Reg::R11, disp.into()), ty))
            }
            _ => unreachable!(),
        }
    }

    /// Put the value of `operand` into `reg`. Aggregates load their address.
    pub(super) fn load(&mut self, reg: Reg, operand: &ast::Operand) -> Result<(), Error> {
        match operand {
            ast::Operand::Int(value) => self.emit(Inst::MOV(reg.into(), Operand::Imm(*value))),
            ast::Operand::Enum(name, variant) => {
                let ordinal = self.state.registry.variant(name, variant)?;
                self.emit(Inst::MOV(reg.into(), Operand::Imm(ordinal)));
            }
            ast::Operand::Str(value) => {
                let label = self.sections.intern(value);
                self.emit(Inst::LEA(reg, Addr::Rip(label)));
            }
            ast::Operand::Global(name) => self.emit(Inst::LEA(reg, Addr::Rip(name.clone()))),
            ast::Operand::AddrOf(name) => {
                let sym = self.lookup(name)?;
                self.emit(Inst::LEA(reg, Addr::frame(sym.offset)));
            }
            place => {
                let (addr, ty) = self.place(place)?;
                if self.state.registry.is_aggregate(&ty) {
                    self.emit(Inst::LEA(reg, addr));
                } else {
                    self.emit(Inst::MOV(reg.into(), addr.into()));
                }
            }
        }
        Ok(())
    }

    /// Source operand for a store: an immediate when one fits, otherwise `rax`.
    pub(super) fn value(&mut self, operand: &ast::Operand) -> Result<Operand, Error> {
        match operand {
            ast::Operand::Int(value) if Operand::fits_imm32(*value) => Ok(Operand::Imm(*value)),
            ast::Operand::Enum(name, variant) => {
                Ok(Operand::Imm(self.state.registry.variant(name, variant)?))
            }
            operand => {
                self.load(Reg::RAX, operand)?;
                Ok(Reg::RAX.into())
            }
        }
    }

    /// Reject values that cannot initialize a slot of type `ty`.
    pub(super) fn check_value(
        &self,
        name: &str,
        ty: &Type,
        value: &ast::Operand,
    ) -> Result<(), Error> {
        match (ty, value) {
            (Type::Bytes, ast::Operand::Str(_)) => Ok(()),
            (ty, ast::Operand::Str(_)) => Err(Error::StringInto(name.to_string(), ty.to_string())),
            (Type::Named(expected), ast::Operand::Enum(found, _))
                if self.state.registry.is_enum(expected) && expected != found =>
            {
                Err(Error::EnumMismatch {
                    expected: expected.clone(),
                    found: found.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// `addr` moved `offset` bytes toward lower addresses.
fn below(addr: Addr, offset: usize) -> Addr {
    match addr {
        Addr::Base(reg, disp) => Addr::Base(reg, disp - offset as i64),
        rip => rip,
    }
}
