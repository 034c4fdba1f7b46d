//! Generates Python ctypes bindings from annotated C/C++ interface files.
//!
//! Exported functions are declared with an export marker (`DLL_EXPORT` by
//! default); parameters carrying the output keyword (`OUT`) become optional
//! output buffers of the generated Python function.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod token;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

pub use ast::{FunctionDescriptor, InterfaceUnit};
pub use codegen::{CodeGenError, CodeGenerator};
pub use config::{GeneratorConfig, ReturnPolicy};
pub use parser::{parse_interface, ParseError};
pub use types::TypeMap;
pub use utils::{generate_bindings_file, generate_module, GenerateError, LibraryJob};
