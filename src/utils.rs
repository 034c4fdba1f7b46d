use crate::codegen::{CodeGenError, CodeGenerator};
use crate::config::GeneratorConfig;
use crate::parser::{parse_interface, ParseError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// One library of a batch: where its interface is declared, where the
/// runtime should search for it, and its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryJob {
    pub interface: PathBuf,
    pub base_folder: String,
    pub library: String,
}

impl LibraryJob {
    pub fn new(
        interface: impl Into<PathBuf>,
        base_folder: impl Into<String>,
        library: impl Into<String>,
    ) -> Self {
        LibraryJob {
            interface: interface.into(),
            base_folder: base_folder.into(),
            library: library.into(),
        }
    }

    /// Zips the per-library lists given on the command line. The lists must
    /// be non-empty and of equal length.
    pub fn from_parallel_lists(
        inputs: Vec<PathBuf>,
        base_folders: Vec<String>,
        libraries: Vec<String>,
    ) -> Result<Vec<LibraryJob>, GenerateError> {
        if inputs.len() != base_folders.len() || inputs.len() != libraries.len() {
            return Err(GenerateError::MismatchedJobLists {
                inputs: inputs.len(),
                base_folders: base_folders.len(),
                libraries: libraries.len(),
            });
        }
        if inputs.is_empty() {
            return Err(GenerateError::NoLibraries);
        }
        Ok(inputs
            .into_iter()
            .zip(base_folders)
            .zip(libraries)
            .map(|((interface, base_folder), library)| LibraryJob::new(interface, base_folder, library))
            .collect())
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("interface files, base folders and library names must be given the same number of times (got {inputs}, {base_folders} and {libraries})")]
    MismatchedJobLists {
        inputs: usize,
        base_folders: usize,
        libraries: usize,
    },
    #[error("no library to generate bindings for")]
    NoLibraries,
    #[error("failed to read interface file '{}': {}", .path.display(), .source)]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} parse error(s) in '{}':\n{}", .errors.len(), .path.display(), join_errors(.errors))]
    Parse {
        path: PathBuf,
        errors: Vec<ParseError>,
    },
    #[error("while generating '{library}': {source}")]
    CodeGen {
        library: String,
        #[source]
        source: CodeGenError,
    },
    #[error("failed to write output file '{}': {}", .path.display(), .source)]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("- {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses every job's interface file and renders the complete Python module
/// in memory. Nothing is written.
pub fn generate_module(
    jobs: &[LibraryJob],
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    let generator = CodeGenerator::from_config(config);
    let mut module = generator.compile_preamble();

    for job in jobs {
        let source = fs::read_to_string(&job.interface).map_err(|source| {
            GenerateError::ReadInput {
                path: job.interface.clone(),
                source,
            }
        })?;

        let filename = job.interface.display().to_string();
        let unit = parse_interface(&filename, &source, &config.export_marker, &config.out_keyword)
            .map_err(|errors| GenerateError::Parse {
                path: job.interface.clone(),
                errors,
            })?;
        info!(
            "{}: {} exported function(s) for library '{}'",
            filename,
            unit.len(),
            job.library
        );

        let section = generator
            .compile_library(&unit, &job.base_folder, &job.library)
            .map_err(|source| GenerateError::CodeGen {
                library: job.library.clone(),
                source,
            })?;
        module.push_str(&section);
        module.push('\n');
    }

    Ok(module)
}

/// Generates the module for all jobs and writes it to `out_file` in one go.
/// On any error the output file is left untouched.
pub fn generate_bindings_file(
    jobs: &[LibraryJob],
    config: &GeneratorConfig,
    out_file: &Path,
) -> Result<(), GenerateError> {
    let module = generate_module(jobs, config)?;
    write_output_file(out_file, &module)?;
    info!("wrote bindings to {}", out_file.display());
    Ok(())
}

pub fn write_output_file(path: &Path, content: &str) -> Result<(), GenerateError> {
    fs::write(path, content).map_err(|source| GenerateError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}
