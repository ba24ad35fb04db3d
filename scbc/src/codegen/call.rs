use arch::{Addr, Inst, Operand, Reg};

use super::{registry::SLOT, CodeGen};
use crate::{
    error::Error,
    grammer::ast::{self, Type},
};

impl CodeGen {
    pub(super) fn call(&mut self, call: &ast::Call) -> Result<(), Error> {
        self.frame()?;
        let regs = self.target.param_regs();
        if call.args.len() > regs.len() && !self.target.spills_args() {
            return Err(Error::TooManyArguments {
                func: call.func.clone(),
                count: call.args.len(),
                max: regs.len(),
                target: self.target.to_string(),
            });
        }

        // Stack arguments, right to left, keeping rsp 16-byte aligned
        let extra = call.args.get(regs.len()..).unwrap_or_default();
        let mut pushed = 0;
        if extra.len() % 2 == 1 {
            self.emit(Inst::SUB(Reg::RSP.into(), Operand::Imm(SLOT as i64)));
            pushed += SLOT;
        }
        for arg in extra.iter().rev() {
            match arg {
                ast::Operand::Int(v) if Operand::fits_imm32(*v) => {
                    self.emit(Inst::PUSH(Operand::Imm(*v)));
                }
                arg => {
                    self.load(Reg::RAX, arg)?;
                    self.emit(Inst::PUSH(Reg::RAX.into()));
                }
            }
            pushed += SLOT;
        }

        for (arg, reg) in call.args.iter().zip(regs) {
            self.load(*reg, arg)?;
        }

        let shadow = self.target.shadow_space();
        if shadow > 0 {
            self.emit(Inst::SUB(Reg::RSP.into(), Operand::Imm(shadow as i64)));
        }
        self.emit(Inst::XOR(Reg::EAX.into(), Reg::EAX.into()));
        self.emit(Inst::CALL(call.func.clone()));
        if shadow + pushed > 0 {
            let size = (shadow + pushed) as i64;
            self.emit(Inst::ADD(Reg::RSP.into(), Operand::Imm(size)));
        }
        Ok(())
    }

    pub(super) fn call_assign(&mut self, assign: &ast::CallAssign) -> Result<(), Error> {
        self.call(&assign.call)?;
        let ty = assign.ty.clone().unwrap_or(Type::Int);
        let offset = self.slot_or_alloc(&assign.dst, ty)?;
        self.emit(Inst::MOV(Addr::frame(offset).into(), Reg::RAX.into()));
        Ok(())
    }
}
