// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # hal-module
//!
//! Exposes a [`Device`]'s kernels to bytecode as the native module `hal`.
//!
//! Every export consumes and produces `hal.buffer_view` refs:
//!
//! | export       | arguments | result            |
//! |--------------|-----------|-------------------|
//! | `hal.add` `hal.sub` `hal.mul` `hal.div` `hal.max` `hal.min` | 2 | element-wise |
//! | `hal.abs` `hal.neg` | 1 | element-wise |
//! | `hal.matmul` | 2         | `[M, K] @ [K, N]` |
//! | `hal.copy`   | 1         | deep copy         |
//!
//! [`register_hal_types`] must run before a [`HalModule`] is created.

use hal::{BufferView, Device};
use std::sync::{Arc, OnceLock};
use tensor_core::{BinaryOp, UnaryOp};
use vm::{ImportScope, Linkage, Module, Ref, RefType, Value, VmError};

/// Registered name of the buffer view ref type.
pub const BUFFER_VIEW_TYPE: &str = "hal.buffer_view";

/// Module name bytecode imports use (`"hal.add"`).
pub const MODULE_NAME: &str = "hal";

#[derive(Debug, Clone, Copy)]
enum Kernel {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Matmul,
    Copy,
}

impl Kernel {
    /// Number of buffer view arguments the kernel takes.
    fn arity(self) -> usize {
        match self {
            Kernel::Binary(_) | Kernel::Matmul => 2,
            Kernel::Unary(_) | Kernel::Copy => 1,
        }
    }
}

const EXPORTS: [(&str, Kernel); 10] = [
    ("add", Kernel::Binary(BinaryOp::Add)),
    ("sub", Kernel::Binary(BinaryOp::Sub)),
    ("mul", Kernel::Binary(BinaryOp::Mul)),
    ("div", Kernel::Binary(BinaryOp::Div)),
    ("max", Kernel::Binary(BinaryOp::Max)),
    ("min", Kernel::Binary(BinaryOp::Min)),
    ("abs", Kernel::Unary(UnaryOp::Abs)),
    ("neg", Kernel::Unary(UnaryOp::Neg)),
    ("matmul", Kernel::Matmul),
    ("copy", Kernel::Copy),
];

/// Registers the HAL ref types with the VM. Safe to call repeatedly and
/// from several threads; only the first call registers anything.
pub fn register_hal_types() -> Result<RefType, VmError> {
    static REGISTERED: OnceLock<RefType> = OnceLock::new();
    if let Some(ty) = REGISTERED.get() {
        return Ok(*ty);
    }
    let ty = vm::register_type::<BufferView>(BUFFER_VIEW_TYPE)?;
    Ok(*REGISTERED.get_or_init(|| ty))
}

/// Wraps a buffer view as a VM value.
pub fn buffer_view_value(view: BufferView) -> Result<Value, VmError> {
    Ok(Value::Ref(Ref::new(view)?))
}

/// Extracts the buffer view held by `value`.
pub fn as_buffer_view(value: &Value) -> Result<Arc<BufferView>, VmError> {
    match value {
        Value::Ref(r) => r.downcast::<BufferView>(),
        other => Err(VmError::TypeMismatch {
            expected: BUFFER_VIEW_TYPE.to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

/// The native `hal` module bound to one device.
pub struct HalModule {
    device: Arc<Device>,
    buffer_view_type: RefType,
}

impl HalModule {
    /// Binds a new HAL module to `device`.
    ///
    /// # Errors
    /// [`VmError::UnregisteredType`] if [`register_hal_types`] has not run.
    pub fn new(device: Arc<Device>) -> Result<Self, VmError> {
        let buffer_view_type = vm::lookup_type(BUFFER_VIEW_TYPE)
            .ok_or(VmError::UnregisteredType(BUFFER_VIEW_TYPE))?;
        tracing::debug!(driver = device.driver(), "hal module created");
        Ok(Self {
            device,
            buffer_view_type,
        })
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn buffer_view_type(&self) -> RefType {
        self.buffer_view_type
    }

    fn run(
        &self,
        function: &str,
        kernel: Kernel,
        args: &[Arc<BufferView>],
    ) -> Result<BufferView, VmError> {
        let device = &self.device;
        let result = match (kernel, args) {
            (Kernel::Binary(op), [lhs, rhs]) => device.binary(op, lhs, rhs),
            (Kernel::Unary(op), [input]) => device.unary(op, input),
            (Kernel::Matmul, [lhs, rhs]) => device.matmul(lhs, rhs),
            (Kernel::Copy, [input]) => device.copy(input),
            _ => {
                return Err(VmError::ArityMismatch {
                    function: function.to_string(),
                    what: "arguments",
                    expected: kernel.arity(),
                    actual: args.len(),
                })
            }
        };
        result.map_err(|source| VmError::Native {
            function: function.to_string(),
            source: Box::new(source),
        })
    }
}

impl Module for HalModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn imports(&self) -> &[String] {
        &[]
    }

    fn function_count(&self) -> usize {
        EXPORTS.len()
    }

    fn lookup_function(&self, _linkage: Linkage, name: &str) -> Option<usize> {
        EXPORTS.iter().position(|(export, _)| *export == name)
    }

    fn function_name(&self, ordinal: usize) -> Option<&str> {
        EXPORTS.get(ordinal).map(|(name, _)| *name)
    }

    fn reflection_attr(&self, _ordinal: usize, _key: &str) -> Option<&str> {
        None
    }

    fn invoke(
        &self,
        ordinal: usize,
        args: &[Value],
        _imports: &ImportScope<'_>,
    ) -> Result<Vec<Value>, VmError> {
        let (name, kernel) = *EXPORTS.get(ordinal).ok_or_else(|| VmError::FunctionNotFound {
            module: MODULE_NAME.to_string(),
            function: format!("#{ordinal}"),
        })?;
        let qualified = format!("{MODULE_NAME}.{name}");
        let views = args
            .iter()
            .map(as_buffer_view)
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.run(&qualified, kernel, &views)?;
        Ok(vec![buffer_view_value(result)?])
    }
}

impl std::fmt::Debug for HalModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalModule")
            .field("device", &self.device)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::{create_device, HalError, MemoryBudget};
    use tensor_core::{Shape, Tensor};

    fn module() -> HalModule {
        register_hal_types().unwrap();
        let device = create_device("vmla", MemoryBudget::unlimited()).unwrap();
        HalModule::new(device).unwrap()
    }

    fn value(module: &HalModule, tensor: &Tensor) -> Value {
        let view = module.device().allocator().wrap_tensor(tensor).unwrap();
        buffer_view_value(view).unwrap()
    }

    fn call(module: &HalModule, name: &str, args: &[Value]) -> Result<Vec<Value>, VmError> {
        let ordinal = module.lookup_function(Linkage::Export, name).unwrap();
        module.invoke(ordinal, args, &ImportScope::empty())
    }

    #[test]
    fn test_registration_is_idempotent() {
        let a = register_hal_types().unwrap();
        let b = register_hal_types().unwrap();
        assert_eq!(a, b);
        assert_eq!(vm::lookup_type(BUFFER_VIEW_TYPE), Some(a));
    }

    #[test]
    fn test_exports() {
        let m = module();
        assert_eq!(m.exports().len(), 10);
        assert_eq!(m.function_name(8), Some("matmul"));
        assert_eq!(m.lookup_function(Linkage::Export, "conv"), None);
    }

    #[test]
    fn test_add() {
        let m = module();
        let a = value(&m, &Tensor::from_values(Shape::matrix(2, 2), &[1i32, 2, 3, 4]).unwrap());
        let b = value(&m, &Tensor::from_values(Shape::matrix(2, 2), &[5i32, 6, 7, 8]).unwrap());
        let out = call(&m, "add", &[a, b]).unwrap();
        let view = as_buffer_view(&out[0]).unwrap();
        assert_eq!(view.to_vec::<i32>().unwrap(), vec![6, 8, 10, 12]);
    }

    #[test]
    fn test_matmul_and_neg() {
        let m = module();
        let a = value(&m, &Tensor::from_values(Shape::matrix(1, 2), &[1.0f32, 2.0]).unwrap());
        let b = value(&m, &Tensor::from_values(Shape::matrix(2, 1), &[3.0f32, 4.0]).unwrap());
        let prod = call(&m, "matmul", &[a, b]).unwrap();
        let neg = call(&m, "neg", &prod).unwrap();
        let view = as_buffer_view(&neg[0]).unwrap();
        assert_eq!(view.shape(), &Shape::matrix(1, 1));
        assert_eq!(view.to_vec::<f32>().unwrap(), vec![-11.0]);
    }

    #[test]
    fn test_wrong_arity_and_type() {
        let m = module();
        let a = value(&m, &Tensor::from_values(Shape::vector(1), &[1i32]).unwrap());
        assert!(matches!(
            call(&m, "add", &[a.clone()]),
            Err(VmError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            call(&m, "neg", &[a.clone(), a.clone()]),
            Err(VmError::ArityMismatch { expected: 1, actual: 2, .. })
        ));
        assert!(matches!(
            call(&m, "matmul", &[a.clone()]),
            Err(VmError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            call(&m, "add", &[a, Value::I32(1)]),
            Err(VmError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_kernel_error_keeps_source() {
        let m = module();
        let a = value(&m, &Tensor::from_values(Shape::vector(2), &[1i32, 2]).unwrap());
        let b = value(&m, &Tensor::from_values(Shape::vector(3), &[1i32, 2, 3]).unwrap());
        let err = call(&m, "sub", &[a, b]).unwrap_err();
        match err {
            VmError::Native { function, source } => {
                assert_eq!(function, "hal.sub");
                assert!(source.downcast_ref::<HalError>().is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
