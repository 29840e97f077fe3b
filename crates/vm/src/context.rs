// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! VM instances, execution contexts and import resolution.
//!
//! A [`Context`] is an ordered list of modules. When a module is registered
//! its imports are resolved against the modules already in the list, so
//! dependencies must come first:
//!
//! ```text
//! [hal, program]   program imports "hal.add"  → resolves
//! [program, hal]   program imports "hal.add"  → UnresolvedImport
//! ```

use crate::{Function, Linkage, Module, Value, VariantList, VmError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vm_bytecode::module::split_qualified;

/// Shared VM state. Contexts created from the same instance receive
/// strictly increasing ids.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    next_context_id: Arc<AtomicU64>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_context_id(&self) -> u64 {
        self.next_context_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Clone, Copy)]
struct ResolvedImport {
    module_index: usize,
    ordinal: usize,
}

struct ModuleEntry {
    module: Arc<dyn Module>,
    imports: Vec<ResolvedImport>,
}

/// The imports of one module, as seen while that module executes.
pub struct ImportScope<'a> {
    entries: &'a [ModuleEntry],
    module_index: usize,
}

impl<'a> ImportScope<'a> {
    /// A scope with no imports, for invoking modules that import nothing.
    pub fn empty() -> ImportScope<'static> {
        ImportScope {
            entries: &[],
            module_index: 0,
        }
    }

    /// Calls import number `import` of the executing module.
    pub fn call(&self, import: usize, args: &[Value]) -> Result<Vec<Value>, VmError> {
        let resolved = self
            .entries
            .get(self.module_index)
            .and_then(|entry| entry.imports.get(import))
            .ok_or_else(|| VmError::FunctionNotFound {
                module: self
                    .entries
                    .get(self.module_index)
                    .map(|e| e.module.name().to_string())
                    .unwrap_or_default(),
                function: format!("import #{import}"),
            })?;
        let target = &self.entries[resolved.module_index];
        let scope = ImportScope {
            entries: self.entries,
            module_index: resolved.module_index,
        };
        target.module.invoke(resolved.ordinal, args, &scope)
    }
}

/// An ordered set of modules with their imports resolved.
pub struct Context {
    id: u64,
    instance: Instance,
    entries: Vec<ModuleEntry>,
}

impl Context {
    /// Creates an empty context.
    pub fn new(instance: &Instance) -> Self {
        let ctx = Self {
            id: instance.allocate_context_id(),
            instance: instance.clone(),
            entries: Vec::new(),
        };
        tracing::debug!(context = ctx.id, "context created");
        ctx
    }

    /// Creates a context and registers `modules` in order.
    pub fn with_modules(instance: &Instance, modules: &[Arc<dyn Module>]) -> Result<Self, VmError> {
        let mut ctx = Self::new(instance);
        ctx.register_modules(modules)?;
        Ok(ctx)
    }

    /// Appends `modules`, resolving each one's imports against everything
    /// registered before it. On error the context is left unchanged.
    pub fn register_modules(&mut self, modules: &[Arc<dyn Module>]) -> Result<(), VmError> {
        let mut staged: Vec<ModuleEntry> = Vec::with_capacity(modules.len());
        for module in modules {
            let known = self.entries.iter().chain(staged.iter());
            if known.clone().any(|e| e.module.name() == module.name()) {
                return Err(VmError::DuplicateModule(module.name().to_string()));
            }
            let imports = module
                .imports()
                .iter()
                .map(|import| resolve_import(known.clone(), module.name(), import))
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(
                context = self.id,
                module = module.name(),
                imports = imports.len(),
                "module registered"
            );
            staged.push(ModuleEntry {
                module: Arc::clone(module),
                imports,
            });
        }
        self.entries.extend(staged);
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.entries.iter().map(|e| &e.module)
    }

    pub fn find_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules().find(|m| m.name() == name)
    }

    /// Resolves an exported `module.function` name.
    pub fn resolve_function(&self, qualified: &str) -> Option<Function> {
        let (module, function) = split_qualified(qualified)?;
        Function::lookup(self.find_module(module)?, Linkage::Export, function)
    }

    fn scope_for(&self, module: &Arc<dyn Module>) -> Option<ImportScope<'_>> {
        self.entries
            .iter()
            .position(|e| Arc::ptr_eq(&e.module, module))
            .map(|module_index| ImportScope {
                entries: &self.entries,
                module_index,
            })
    }
}

fn resolve_import<'a>(
    known: impl Iterator<Item = &'a ModuleEntry>,
    importer: &str,
    import: &str,
) -> Result<ResolvedImport, VmError> {
    let unresolved = || VmError::UnresolvedImport {
        module: importer.to_string(),
        import: import.to_string(),
    };
    let (module_name, function_name) = split_qualified(import).ok_or_else(unresolved)?;
    known
        .enumerate()
        .find(|(_, e)| e.module.name() == module_name)
        .and_then(|(module_index, e)| {
            e.module
                .lookup_function(Linkage::Export, function_name)
                .map(|ordinal| ResolvedImport {
                    module_index,
                    ordinal,
                })
        })
        .ok_or_else(unresolved)
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field(
                "modules",
                &self.modules().map(|m| m.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Invokes `function` with `inputs`, appending its results to `outputs`.
///
/// # Errors
/// [`VmError::ModuleNotInContext`] if the function's module was never
/// registered in `context`; otherwise whatever the function raises.
pub fn invoke(
    context: &Context,
    function: &Function,
    inputs: &VariantList,
    outputs: &mut VariantList,
) -> Result<(), VmError> {
    let scope = context
        .scope_for(function.module())
        .ok_or_else(|| VmError::ModuleNotInContext(function.module().name().to_string()))?;
    let results = function
        .module()
        .invoke(function.ordinal(), inputs.as_slice(), &scope)?;
    for value in results {
        outputs.push(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BytecodeModule;

    /// Native module exporting `math.add(i32, i32) -> i32`.
    struct MathModule;

    impl Module for MathModule {
        fn name(&self) -> &str {
            "math"
        }

        fn imports(&self) -> &[String] {
            &[]
        }

        fn function_count(&self) -> usize {
            1
        }

        fn lookup_function(&self, _linkage: Linkage, name: &str) -> Option<usize> {
            (name == "add").then_some(0)
        }

        fn function_name(&self, ordinal: usize) -> Option<&str> {
            (ordinal == 0).then_some("add")
        }

        fn reflection_attr(&self, _ordinal: usize, _key: &str) -> Option<&str> {
            None
        }

        fn invoke(
            &self,
            _ordinal: usize,
            args: &[Value],
            _imports: &ImportScope<'_>,
        ) -> Result<Vec<Value>, VmError> {
            match args {
                [Value::I32(a), Value::I32(b)] => Ok(vec![Value::I32(a + b)]),
                _ => Err(VmError::TypeMismatch {
                    expected: "(i32, i32)".into(),
                    actual: format!("{} arguments", args.len()),
                }),
            }
        }
    }

    const PROGRAM: &str = r#"{
        "name": "program",
        "imports": ["math.add"],
        "functions": [{
            "name": "add3", "export": true,
            "num_registers": 5, "num_args": 3,
            "body": [
                {"op": "call_import", "import": 0, "args": [0, 1], "results": [3]},
                {"op": "call_import", "import": 0, "args": [3, 2], "results": [4]},
                {"op": "return", "values": [4]}
            ]
        }]
    }"#;

    fn modules() -> (Arc<dyn Module>, Arc<dyn Module>) {
        let math: Arc<dyn Module> = Arc::new(MathModule);
        let program: Arc<dyn Module> =
            Arc::new(BytecodeModule::from_bytes(PROGRAM.as_bytes()).unwrap());
        (math, program)
    }

    fn args(values: &[i32]) -> VariantList {
        let mut list = VariantList::with_capacity(values.len());
        for v in values {
            list.push(Value::I32(*v)).unwrap();
        }
        list
    }

    #[test]
    fn test_dependencies_first_resolves() {
        let instance = Instance::new();
        let (math, program) = modules();
        let ctx = Context::with_modules(&instance, &[math, program.clone()]).unwrap();

        let add3 = Function::lookup(&program, Linkage::Export, "add3").unwrap();
        let mut outputs = VariantList::with_capacity(1);
        invoke(&ctx, &add3, &args(&[1, 2, 3]), &mut outputs).unwrap();
        assert!(matches!(outputs.get(0), Some(Value::I32(6))));
    }

    #[test]
    fn test_swapped_order_fails() {
        let instance = Instance::new();
        let (math, program) = modules();
        let err = Context::with_modules(&instance, &[program, math]).unwrap_err();
        assert!(matches!(
            err,
            VmError::UnresolvedImport { ref module, ref import } if module == "program" && import == "math.add"
        ));
    }

    #[test]
    fn test_incremental_registration() {
        let instance = Instance::new();
        let (math, program) = modules();
        let mut ctx = Context::new(&instance);

        assert!(ctx.register_modules(&[program.clone()]).is_err());
        assert_eq!(ctx.modules().count(), 0);

        ctx.register_modules(&[math]).unwrap();
        ctx.register_modules(&[program]).unwrap();
        assert_eq!(ctx.modules().count(), 2);
        assert!(ctx.resolve_function("program.add3").is_some());
        assert!(ctx.resolve_function("program.missing").is_none());
        assert!(ctx.resolve_function("math.add").is_some());
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let instance = Instance::new();
        let (math, _) = modules();
        let other: Arc<dyn Module> = Arc::new(MathModule);
        assert!(matches!(
            Context::with_modules(&instance, &[math, other]),
            Err(VmError::DuplicateModule(_))
        ));
    }

    #[test]
    fn test_context_ids_increase() {
        let instance = Instance::new();
        let a = Context::new(&instance);
        let b = Context::new(&instance);
        let c = Context::new(&instance.clone());
        assert!(a.id() < b.id());
        assert!(b.id() < c.id());
    }

    #[test]
    fn test_invoke_outside_context() {
        let instance = Instance::new();
        let (math, _) = modules();
        let ctx = Context::with_modules(&instance, &[math.clone()]).unwrap();
        let add = Function::lookup(&math, Linkage::Export, "add").unwrap();
        let foreign: Arc<dyn Module> = Arc::new(MathModule);
        let foreign_add = Function::lookup(&foreign, Linkage::Export, "add").unwrap();

        let mut out = VariantList::default();
        invoke(&ctx, &add, &args(&[2, 3]), &mut out).unwrap();
        assert!(matches!(
            invoke(&ctx, &foreign_add, &args(&[2, 3]), &mut out),
            Err(VmError::ModuleNotInContext(_))
        ));
    }
}
