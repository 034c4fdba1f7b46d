use crate::location::Span;
use indexmap::IndexMap;
use tracing::warn;

// src/ast.rs

/// One exported function, as decomposed from its declaration.
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Canonical spelling, empty when the declaration has none
    pub return_type: String,
    /// Ordinary parameters in declaration order
    pub parameters: Vec<String>,
    /// Parameters flagged with the output keyword, in declaration order
    pub output_buffer_parameters: Vec<String>,
    pub span: Span, // Span from the export marker to the closing ')'
}

impl FunctionDescriptor {
    pub fn is_void(&self) -> bool {
        self.return_type == "void"
    }

    pub fn has_output_buffers(&self) -> bool {
        !self.output_buffer_parameters.is_empty()
    }

    // Ordinary parameters first, then output buffers
    pub fn call_arguments(&self) -> impl Iterator<Item = &String> {
        self.parameters
            .iter()
            .chain(self.output_buffer_parameters.iter())
    }
}

/// Descriptors of one interface file keyed by name, in declaration order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct InterfaceUnit {
    pub functions: IndexMap<String, FunctionDescriptor>,
}

impl InterfaceUnit {
    pub fn new() -> Self {
        InterfaceUnit {
            functions: IndexMap::new(),
        }
    }

    /// Adds a descriptor. A redeclared name replaces the earlier descriptor
    /// but keeps its position.
    pub fn insert(&mut self, descriptor: FunctionDescriptor) {
        if let Some(previous) = self.functions.get(&descriptor.name) {
            warn!(
                "{}: '{}' redeclared, replacing declaration from {}",
                descriptor.span, descriptor.name, previous.span
            );
        }
        self.functions.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.values()
    }
}

// Builds a descriptor with a default span, handy in tests
pub fn def(
    name: &str,
    return_type: &str,
    parameters: &[&str],
    output_buffer_parameters: &[&str],
) -> FunctionDescriptor {
    FunctionDescriptor {
        name: name.to_string(),
        return_type: return_type.to_string(),
        parameters: parameters.iter().map(|p| p.to_string()).collect(),
        output_buffer_parameters: output_buffer_parameters
            .iter()
            .map(|p| p.to_string())
            .collect(),
        span: Span::default(),
    }
}
