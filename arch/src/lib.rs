pub mod asm;
pub mod inst;
pub mod reg;
pub mod target;

pub use asm::Line;
pub use inst::{Addr, Inst, Jump, Operand};
pub use reg::Reg;
pub use target::Target;
