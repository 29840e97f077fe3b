// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Process-wide ref type registry and type-tagged references.
//!
//! Native modules hand opaque objects to bytecode as [`Ref`]s. Every Rust
//! type that travels as a ref must first be registered under a stable name
//! (`"hal.buffer_view"`, …). Registration is idempotent: registering the same
//! name for the same Rust type again returns the existing [`RefType`].

use crate::VmError;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// Handle to a registered ref type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefType {
    id: usize,
    name: &'static str,
    type_id: TypeId,
}

impl RefType {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn registry() -> &'static RwLock<Vec<RefType>> {
    static REGISTRY: OnceLock<RwLock<Vec<RefType>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Vec::new()))
}

/// Registers `T` under `name`.
///
/// # Errors
/// [`VmError::TypeConflict`] if `name` is registered for another Rust type,
/// or `T` is registered under another name.
pub fn register_type<T: Any + Send + Sync>(name: &'static str) -> Result<RefType, VmError> {
    let type_id = TypeId::of::<T>();
    let mut types = registry().write().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(existing) = types
        .iter()
        .find(|t| t.name == name || t.type_id == type_id)
    {
        if existing.name == name && existing.type_id == type_id {
            return Ok(*existing);
        }
        return Err(VmError::TypeConflict {
            name: name.to_string(),
            detail: format!(
                "already registered as '{}' for {}",
                existing.name,
                if existing.type_id == type_id {
                    "this Rust type"
                } else {
                    "a different Rust type"
                }
            ),
        });
    }

    let ty = RefType {
        id: types.len(),
        name,
        type_id,
    };
    types.push(ty);
    tracing::debug!(name, id = ty.id, "registered ref type");
    Ok(ty)
}

/// Looks up a registered type by name.
pub fn lookup_type(name: &str) -> Option<RefType> {
    registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .iter()
        .find(|t| t.name == name)
        .copied()
}

/// Looks up the registration of Rust type `T`.
pub fn lookup_type_of<T: Any>() -> Option<RefType> {
    let type_id = TypeId::of::<T>();
    registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .iter()
        .find(|t| t.type_id == type_id)
        .copied()
}

/// A type-tagged, reference-counted handle to a native object.
#[derive(Clone)]
pub struct Ref {
    ty: RefType,
    object: Arc<dyn Any + Send + Sync>,
}

impl Ref {
    /// Wraps `object`, whose type must be registered.
    pub fn new<T: Any + Send + Sync>(object: T) -> Result<Self, VmError> {
        Self::from_arc(Arc::new(object))
    }

    /// Wraps an already shared object.
    pub fn from_arc<T: Any + Send + Sync>(object: Arc<T>) -> Result<Self, VmError> {
        let ty = lookup_type_of::<T>()
            .ok_or(VmError::UnregisteredType(std::any::type_name::<T>()))?;
        let object: Arc<dyn Any + Send + Sync> = object;
        Ok(Self { ty, object })
    }

    pub fn ref_type(&self) -> RefType {
        self.ty
    }

    /// Returns the object as `Arc<T>` if the ref holds a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>, VmError> {
        Arc::clone(&self.object)
            .downcast::<T>()
            .map_err(|_| VmError::TypeMismatch {
                expected: lookup_type_of::<T>()
                    .map(|t| t.name.to_string())
                    .unwrap_or_else(|| std::any::type_name::<T>().to_string()),
                actual: self.ty.name.to_string(),
            })
    }

    /// Borrows the object as `&T` if the ref holds a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Address of the referenced object; equal for refs to the same object.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.object) as *const () as usize
    }

    /// Returns `true` if both refs point at the same object.
    pub fn ptr_eq(&self, other: &Ref) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref<{}>@{:#x}", self.ty.name, self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blob(Vec<u8>);
    struct Other;
    struct Unregistered;

    #[test]
    fn test_register_is_idempotent() {
        let a = register_type::<Blob>("test.blob").unwrap();
        let b = register_type::<Blob>("test.blob").unwrap();
        assert_eq!(a, b);
        assert_eq!(lookup_type("test.blob"), Some(a));
        assert_eq!(lookup_type_of::<Blob>(), Some(a));
    }

    #[test]
    fn test_conflicting_registration() {
        register_type::<Other>("test.other").unwrap();
        assert!(matches!(
            register_type::<Blob>("test.other"),
            Err(VmError::TypeConflict { .. })
        ));
        assert!(matches!(
            register_type::<Other>("test.other_renamed"),
            Err(VmError::TypeConflict { .. })
        ));
    }

    #[test]
    fn test_ref_downcast() {
        register_type::<Blob>("test.blob").unwrap();
        let r = Ref::new(Blob(vec![1, 2, 3])).unwrap();
        assert_eq!(r.ref_type().name(), "test.blob");
        assert_eq!(r.downcast::<Blob>().unwrap().0, vec![1, 2, 3]);
        assert_eq!(r.downcast_ref::<Blob>().map(|b| b.0.len()), Some(3));
        assert!(r.downcast::<Other>().is_err());
    }

    #[test]
    fn test_ref_identity() {
        register_type::<Blob>("test.blob").unwrap();
        let r = Ref::new(Blob(vec![])).unwrap();
        let clone = r.clone();
        let other = Ref::new(Blob(vec![])).unwrap();
        assert!(r.ptr_eq(&clone));
        assert!(!r.ptr_eq(&other));
    }

    #[test]
    fn test_unregistered_type_rejected() {
        assert!(matches!(
            Ref::new(Unregistered),
            Err(VmError::UnregisteredType(_))
        ));
    }
}
