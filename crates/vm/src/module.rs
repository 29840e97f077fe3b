// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The module interface shared by bytecode and native modules.

use crate::{ImportScope, Value, VmError};
use std::fmt;
use std::sync::Arc;

/// Which functions a lookup may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// Only functions visible outside the module.
    Export,
    /// Any function defined by the module.
    Internal,
}

/// A unit of executable code registered in a [`Context`](crate::Context).
///
/// Functions are addressed by ordinal. Imports are fully qualified names
/// (`"hal.add"`) that the context resolves against modules registered
/// before this one; at call time they are reached through the
/// [`ImportScope`] passed to [`invoke`](Module::invoke).
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Qualified names of the functions this module imports.
    fn imports(&self) -> &[String];

    fn function_count(&self) -> usize;

    /// Returns the ordinal of `name`, honouring `linkage`.
    fn lookup_function(&self, linkage: Linkage, name: &str) -> Option<usize>;

    fn function_name(&self, ordinal: usize) -> Option<&str>;

    /// Returns a reflection attribute of a function (`"fv"`, `"inputs"`, …).
    fn reflection_attr(&self, ordinal: usize, key: &str) -> Option<&str>;

    /// Runs function `ordinal` with `args`.
    fn invoke(
        &self,
        ordinal: usize,
        args: &[Value],
        imports: &ImportScope<'_>,
    ) -> Result<Vec<Value>, VmError>;

    /// Names of exported functions, in ordinal order.
    fn exports(&self) -> Vec<String> {
        (0..self.function_count())
            .filter_map(|i| self.function_name(i))
            .filter(|name| self.lookup_function(Linkage::Export, name).is_some())
            .map(str::to_string)
            .collect()
    }
}

/// A resolved function: its module plus the ordinal within it.
#[derive(Clone)]
pub struct Function {
    module: Arc<dyn Module>,
    ordinal: usize,
    linkage: Linkage,
}

impl Function {
    /// Looks up `name` in `module`.
    pub fn lookup(module: &Arc<dyn Module>, linkage: Linkage, name: &str) -> Option<Self> {
        module.lookup_function(linkage, name).map(|ordinal| Self {
            module: Arc::clone(module),
            ordinal,
            linkage,
        })
    }

    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn name(&self) -> &str {
        self.module.function_name(self.ordinal).unwrap_or_default()
    }

    /// `module.function`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module.name(), self.name())
    }

    pub fn reflection_attr(&self, key: &str) -> Option<&str> {
        self.module.reflection_attr(self.ordinal, key)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.qualified_name())
            .field("ordinal", &self.ordinal)
            .field("linkage", &self.linkage)
            .finish()
    }
}
