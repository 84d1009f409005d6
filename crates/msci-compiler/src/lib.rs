pub mod codegen;
pub mod context;
pub mod linker;
pub mod macro_expand;
pub mod parameters;
pub mod pipeline;
pub mod printer;
pub mod search;
pub mod structure;
pub mod symbols;
pub mod termination;

pub use codegen::generate;
pub use context::{CompileOptions, CompileServices};
pub use linker::{finalize, index, link};
pub use macro_expand::{detect_array_initializer, expand_macros, ArrayInitializer};
pub use parameters::{check_parameter, verify_parameters, ParameterFault};
pub use pipeline::{CompiledScript, ParsedScript, ScriptCompiler, VerifiedScript};
pub use printer::print_tree;
pub use search::find_symbols;
pub use structure::verify_structure;
pub use symbols::{identify_symbols, resolve_script_calls};
pub use termination::verify_termination;
