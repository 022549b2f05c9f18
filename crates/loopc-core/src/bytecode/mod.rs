//! Bytecode primitives: the opcode table (§4.4), runtime value/chunk shapes
//! (§3), the instruction emitter, and the tree-walk code generator (§4.5).

mod codegen;
mod emitter;
mod opcode;
mod value;

pub use codegen::CodeGen;
pub use emitter::Emitter;
pub use opcode::Opcode;
pub use value::{Chunk, ClassValue, FunctionValue, ModuleValue, Value};
