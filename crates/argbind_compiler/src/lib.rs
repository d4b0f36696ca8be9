//! argbind_compiler: Compiler orchestration.
//!
//! Holds the program's compilation units, compiles every body's binding
//! prologue in parallel and consults the compilation cache.

pub mod cache;

pub use cache::{CacheError, CacheKey, CompilationCache};

use argbind_ast::{parse_unit, Body, CompilationUnit};
use argbind_binder::{bind_parameters, bind_targets, BinderOptions};
use argbind_core::{NameInterner, SpecArena};
use argbind_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use argbind_ir::Instruction;
use argbind_options::CompilerOptions;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// A body whose binding prologue compiled successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBody {
    pub file: String,
    pub name: String,
    pub instructions: Vec<Instruction>,
    /// Served from the cache rather than compiled.
    pub cached: bool,
}

/// Everything one `compile` call produced, in source order.
#[derive(Debug, Default)]
pub struct CompileOutput {
    pub bodies: Vec<CompiledBody>,
    pub diagnostics: DiagnosticCollection,
}

impl CompileOutput {
    pub fn body(&self, name: &str) -> Option<&CompiledBody> {
        self.bodies.iter().find(|body| body.name == name)
    }
}

/// The program represents the entire compilation.
pub struct Program {
    pub options: CompilerOptions,
    units: Vec<CompilationUnit>,
    interner: NameInterner,
    cache: Option<CompilationCache>,
    /// Problems found while loading units.
    load_diagnostics: DiagnosticCollection,
}

impl Program {
    /// Create a program. The cache follows `options`: off with `noCache`,
    /// persisted under `cacheDir` when given, in memory otherwise.
    pub fn new(options: CompilerOptions) -> Self {
        let cache = if !options.cache_enabled() {
            None
        } else if let Some(dir) = &options.cache_dir {
            match CompilationCache::persistent(dir) {
                Ok(cache) => Some(cache),
                Err(err) => {
                    warn!(%err, "falling back to an in-memory cache");
                    Some(CompilationCache::in_memory())
                }
            }
        } else {
            Some(CompilationCache::in_memory())
        };
        Self {
            options,
            units: Vec::new(),
            interner: NameInterner::new(),
            cache,
            load_diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn add_unit(&mut self, unit: CompilationUnit) {
        self.units.push(unit);
    }

    /// Parse and add a unit. A file that does not parse is reported and
    /// skipped.
    pub fn add_source(&mut self, file_name: &str, text: &str) {
        match parse_unit(text) {
            Ok(mut unit) => {
                if unit.file_name.is_empty() {
                    unit.file_name = file_name.to_string();
                }
                self.units.push(unit);
            }
            Err(err) => self.load_diagnostics.add(Diagnostic::new(
                &messages::INVALID_COMPILATION_UNIT,
                &[file_name, &err.to_string()],
            )),
        }
    }

    /// Load units from disk.
    pub fn load_files<P: AsRef<Path>>(&mut self, files: &[P]) {
        for file in files {
            let path = file.as_ref();
            let name = path.display().to_string();
            match std::fs::read_to_string(path) {
                Ok(text) => self.add_source(&name, &text),
                Err(err) => self.load_diagnostics.add(Diagnostic::new(
                    &messages::CANNOT_READ_FILE,
                    &[&name, &err.to_string()],
                )),
            }
        }
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn cache(&self) -> Option<&CompilationCache> {
        self.cache.as_ref()
    }

    /// Find a body by name, searching units in order.
    pub fn find_body(&self, name: &str) -> Option<&Body> {
        self.units
            .iter()
            .flat_map(|unit| unit.bodies.iter())
            .find(|body| body.name() == name)
    }

    /// Compile every body. Bodies are compiled in parallel, but the output
    /// lists bodies and diagnostics in source order.
    pub fn compile(&self) -> CompileOutput {
        let work: Vec<(&str, &Body)> = self
            .units
            .iter()
            .flat_map(|unit| unit.bodies.iter().map(move |body| (unit.file_name.as_str(), body)))
            .collect();
        info!(bodies = work.len(), units = self.units.len(), "compiling");

        let results = match self.options.jobs {
            Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| self.compile_all(&work)),
                Err(err) => {
                    warn!(%err, "using the global thread pool");
                    self.compile_all(&work)
                }
            },
            None => self.compile_all(&work),
        };

        let mut output = CompileOutput {
            bodies: Vec::with_capacity(results.len()),
            diagnostics: self.load_diagnostics.clone(),
        };
        for (body, diagnostics) in results {
            output.bodies.extend(body);
            for diagnostic in diagnostics {
                output.diagnostics.add(diagnostic);
            }
        }
        output.diagnostics.sort();
        output
    }

    fn compile_all(&self, work: &[(&str, &Body)]) -> Vec<(Option<CompiledBody>, Vec<Diagnostic>)> {
        work.par_iter()
            .map_init(SpecArena::new, |arena, (file, body)| {
                arena.reset();
                self.compile_body(arena, file, body)
            })
            .collect()
    }

    fn compile_body(&self, arena: &SpecArena, file: &str, body: &Body) -> (Option<CompiledBody>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let options = self.binder_options(body);
        let key = CacheKey::new(file, body, options);

        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(Some(instructions)) => {
                    let compiled = CompiledBody {
                        file: file.to_string(),
                        name: body.name().to_string(),
                        instructions,
                        cached: true,
                    };
                    return (Some(compiled), diagnostics);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(file, body = body.name(), %err, "discarding cache entry");
                    cache.evict(&key);
                    diagnostics.push(
                        Diagnostic::with_location(
                            file.to_string(),
                            body.span(),
                            &messages::CACHE_ENTRY_DISCARDED,
                            &[body.name(), &err.to_string()],
                        )
                        .in_body(body.name()),
                    );
                }
            }
        }

        let result = match body {
            Body::Method { parameters, .. }
            | Body::Block { parameters, .. }
            | Body::ForLoop { parameters, .. } => {
                bind_parameters(arena, &self.interner, parameters.as_ref(), options)
            }
            Body::MultipleAssignment { targets, .. } => bind_targets(arena, &self.interner, targets),
        };

        let instructions = match result {
            Ok(instructions) => instructions,
            Err(err) => {
                debug!(file, body = body.name(), %err, "binding failed");
                diagnostics.push(err.to_diagnostic(file).in_body(body.name()));
                return (None, diagnostics);
            }
        };

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.insert(key, &instructions) {
                warn!(file, body = body.name(), %err, "could not cache body");
            }
        }
        debug!(file, body = body.name(), instructions = instructions.len(), "compiled");
        let compiled = CompiledBody {
            file: file.to_string(),
            name: body.name().to_string(),
            instructions,
            cached: false,
        };
        (Some(compiled), diagnostics)
    }

    /// The binder options `body` compiles under. Only `for` loops vary.
    fn binder_options(&self, body: &Body) -> BinderOptions {
        match body {
            Body::ForLoop { .. } => BinderOptions {
                local_only: self.options.for_loop_local_only(),
            },
            _ => BinderOptions::default(),
        }
    }
}
