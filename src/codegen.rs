// src/codegen.rs

use crate::ast::{FunctionDescriptor, InterfaceUnit};
use crate::config::{GeneratorConfig, ReturnPolicy};
use crate::location::Span;
use crate::token::is_identifier;
use crate::types::{TypeLookup, TypeMap};
use thiserror::Error;
use tracing::debug;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeGenError {
    #[error("{span}: Codegen Error: Return type '{return_type}' of '{function}' has no mapping")]
    UnmappedReturnType {
        function: String,
        return_type: String,
        span: Span,
    },
    #[error("{span}: Codegen Error: Output buffer '{buffer}' of '{function}' has no input parameter to take its shape from")]
    MissingShapeSource {
        function: String,
        buffer: String,
        span: Span,
    },
    #[error("Codegen Error: Library name '{0}' is not a valid Python identifier")]
    InvalidLibraryName(String),
}

pub type CodeGenResult<T> = Result<T, CodeGenError>;

/// Renders Python bindings for parsed interface units.
///
/// Every generated function forwards to the dispatcher object bound to the
/// library handle; nothing here loads or calls the native library.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    type_map: TypeMap,
    return_policy: ReturnPolicy,
    runtime_module: String,
    runtime_imports: Vec<String>,
}

impl CodeGenerator {
    pub fn new(type_map: TypeMap, return_policy: ReturnPolicy) -> Self {
        let defaults = GeneratorConfig::default();
        CodeGenerator {
            type_map,
            return_policy,
            runtime_module: defaults.runtime_module,
            runtime_imports: defaults.runtime_imports,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        CodeGenerator {
            type_map: config.type_map(),
            return_policy: config.return_policy,
            runtime_module: config.runtime_module.clone(),
            runtime_imports: config.runtime_imports.clone(),
        }
    }

    fn dispatcher_class(&self) -> &str {
        self.runtime_imports
            .first()
            .map(String::as_str)
            .unwrap_or(crate::config::DEFAULT_RUNTIME_CLASS)
    }

    /// Name of the module-level variable holding a library's dispatcher.
    pub fn handle_name(library: &str) -> String {
        format!("_{}_native_lib", library)
    }

    /// Header of the generated module: encoding line, notice and imports.
    pub fn compile_preamble(&self) -> String {
        let mut out = String::new();
        out.push_str("# coding: utf-8\n\"\"\"\nThis file is auto-generated.\n\"\"\"\n");
        out.push_str("import ctypes\n");
        out.push_str("import numpy as np\n");
        out.push_str(&format!(
            "from {} import {}\n\n",
            self.runtime_module,
            self.runtime_imports.join(", ")
        ));
        out
    }

    /// One library section: the handle binding followed by one function per
    /// descriptor, in declaration order.
    pub fn compile_library(
        &self,
        unit: &InterfaceUnit,
        base_folder: &str,
        library: &str,
    ) -> CodeGenResult<String> {
        if !is_identifier(library) {
            return Err(CodeGenError::InvalidLibraryName(library.to_string()));
        }
        let handle = Self::handle_name(library);

        let mut out = format!(
            "{} = {}({}, {})\n\n\n",
            handle,
            self.dispatcher_class(),
            python_string_literal(base_folder),
            python_string_literal(library)
        );

        let functions = unit
            .iter()
            .map(|function| self.compile_function(&handle, function))
            .collect::<CodeGenResult<Vec<String>>>()?;
        out.push_str(&functions.join("\n\n"));
        Ok(out)
    }

    /// Renders one `def` forwarding to `handle.<name>(...)`.
    pub fn compile_function(
        &self,
        handle: &str,
        function: &FunctionDescriptor,
    ) -> CodeGenResult<String> {
        debug!("generating wrapper for '{}'", function.name);
        let name = &function.name;

        // --- Signature ---
        let signature: Vec<String> = function
            .parameters
            .iter()
            .cloned()
            .chain(
                function
                    .output_buffer_parameters
                    .iter()
                    .map(|b| format!("{}=None", b)),
            )
            .collect();
        let mut out = format!("def {}({}):\n", name, signature.join(", "));

        // --- Output buffer allocation ---
        for buffer in &function.output_buffer_parameters {
            let shape_source =
                function
                    .parameters
                    .first()
                    .ok_or_else(|| CodeGenError::MissingShapeSource {
                        function: name.clone(),
                        buffer: buffer.clone(),
                        span: function.span.clone(),
                    })?;
            line(&mut out, 1, &format!("if {} is None:", buffer));
            line(&mut out, 2, &format!("{} = np.zeros_like({})", buffer, shape_source));
        }

        // --- Return marshalling type ---
        if !function.is_void() {
            let lookup = self.type_map.lookup(&function.return_type).ok_or_else(|| {
                CodeGenError::UnmappedReturnType {
                    function: name.clone(),
                    return_type: function.return_type.clone(),
                    span: function.span.clone(),
                }
            })?;
            if let TypeLookup::Scalar(restype) = lookup {
                line(&mut out, 1, &format!("{}.{}.restype = {}", handle, name, restype));
            }
        }

        // --- Call and return ---
        let arguments: Vec<&str> = function.call_arguments().map(String::as_str).collect();
        let call = format!("{}.{}({})", handle, name, arguments.join(", "));
        let buffers = function.output_buffer_parameters.join(", ");

        match (function.is_void(), function.has_output_buffers()) {
            (true, false) => line(&mut out, 1, &call),
            (true, true) => {
                line(&mut out, 1, &call);
                line(&mut out, 1, &format!("return {}", buffers));
            }
            (false, false) => line(&mut out, 1, &format!("return {}", call)),
            (false, true) => match self.return_policy {
                ReturnPolicy::Scalar => line(&mut out, 1, &format!("return {}", call)),
                ReturnPolicy::Buffers => {
                    line(&mut out, 1, &call);
                    line(&mut out, 1, &format!("return {}", buffers));
                }
                ReturnPolicy::Combined => {
                    line(&mut out, 1, &format!("result = {}", call));
                    line(&mut out, 1, &format!("return result, {}", buffers));
                }
            },
        }

        Ok(out)
    }
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

// Single-quoted Python literal; backslashes in Windows paths stay literal
fn python_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}
