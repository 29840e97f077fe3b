// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Builds everything one run needs: VM instance, program module, device,
//! HAL module and the execution context linking them.
//!
//! ```text
//! register HAL types → instance → load module → device → HAL module
//!                                                            │
//!                          context [hal, program] ◄──────────┘
//! ```
//!
//! The HAL module is registered first because the program imports from
//! it; imports only resolve against earlier modules.

use crate::error::ResultExt;
use crate::{BenchmarkConfig, BenchmarkError};
use hal::{Device, MemoryBudget};
use hal_module::HalModule;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use vm::{BytecodeModule, Context, Function, Instance, Linkage, Module};

/// Maps a module file into memory.
///
/// Only regular files are accepted; stdin, pipes and directories are
/// rejected with [`BenchmarkError::InvalidArgument`]. A missing file is
/// [`crate::StatusCode::NotFound`].
pub fn map_module_file(path: &Path) -> Result<Mmap, BenchmarkError> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(BenchmarkError::InvalidArgument(format!(
            "'{}' is not a regular file; stdin and pipes are not supported",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(BenchmarkError::InvalidArgument(format!(
            "module file '{}' is empty",
            path.display()
        )));
    }
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and only lives while the module is
    // parsed; the file is not expected to change underneath us.
    let map = unsafe { Mmap::map(&file)? };
    tracing::debug!(path = %path.display(), bytes = map.len(), "module file mapped");
    Ok(map)
}

/// The assembled state of one run.
///
/// Fields drop in declaration order: the context goes first, then the
/// modules it references, then the device and the instance.
pub struct Session {
    context: Context,
    program: Arc<dyn Module>,
    hal_module: Arc<dyn Module>,
    device: Arc<Device>,
    instance: Instance,
}

impl Session {
    /// Assembles a session from the module file named in `config`.
    ///
    /// # Errors
    /// [`BenchmarkError::InvalidArgument`] if `input_file` is unset, before
    /// any device or context exists. Otherwise the error names the failing
    /// step.
    pub fn open(config: &BenchmarkConfig) -> Result<Self, BenchmarkError> {
        let path = config
            .input_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| BenchmarkError::InvalidArgument("input_file must be specified".into()))?;
        let budget = config.parse_budget().context("parsing device memory budget")?;
        let bytes = map_module_file(path)
            .with_context(|| format!("reading module file '{}'", path.display()))?;
        Self::from_bytes(&bytes, &config.driver, budget)
    }

    /// Assembles a session from in-memory module bytes.
    pub fn from_bytes(
        module_bytes: &[u8],
        driver: &str,
        budget: MemoryBudget,
    ) -> Result<Self, BenchmarkError> {
        if module_bytes.is_empty() {
            return Err(BenchmarkError::InvalidArgument("module bytes are empty".into()));
        }
        hal_module::register_hal_types().context("registering HAL types")?;
        let instance = Instance::new();

        let program: Arc<dyn Module> =
            Arc::new(BytecodeModule::from_bytes(module_bytes).context("loading module")?);
        tracing::debug!(module = program.name(), "program module loaded");

        let device = hal::create_device(driver, budget).context("creating device")?;
        let hal_module: Arc<dyn Module> =
            Arc::new(HalModule::new(Arc::clone(&device)).context("creating HAL module")?);

        let modules = [Arc::clone(&hal_module), Arc::clone(&program)];
        let context = Context::with_modules(&instance, &modules).context("creating context")?;

        tracing::info!(
            module = program.name(),
            driver,
            context = context.id(),
            "session assembled"
        );
        Ok(Self {
            context,
            program,
            hal_module,
            device,
            instance,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn program(&self) -> &Arc<dyn Module> {
        &self.program
    }

    pub fn hal_module(&self) -> &Arc<dyn Module> {
        &self.hal_module
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Registers further modules after the program. They may import from
    /// the HAL and program modules, never the reverse.
    pub fn register_modules(&mut self, modules: &[Arc<dyn Module>]) -> Result<(), BenchmarkError> {
        self.context
            .register_modules(modules)
            .context("registering modules")
    }

    /// Looks up an exported function of the program module.
    pub fn lookup_function(&self, name: &str) -> Result<Function, BenchmarkError> {
        Function::lookup(&self.program, Linkage::Export, name).ok_or_else(|| {
            BenchmarkError::NotFound(format!(
                "module '{}' exports no function '{name}'",
                self.program.name()
            ))
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("context", &self.context)
            .field("driver", &self.device.driver())
            .finish_non_exhaustive()
    }
}
