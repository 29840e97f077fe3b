// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The invocation protocol with a type-state–enforced warm-up.
//!
//! ```text
//! Invocation<Cold>
//!     │  .warm_up()        one untimed call, failure propagates
//!     ▼
//! Invocation<Warm>
//!     │  .run_timed(state) timed calls, failure aborts the process
//!     ▼
//!   input checksum verified
//! ```
//!
//! Only a warmed-up invocation exposes the timed loop, so a timed call can
//! never precede the warm-up.

use crate::error::ResultExt;
use crate::signature::{
    parse_input_signature, parse_output_signature, validate_function_abi, Descriptor,
};
use crate::{materialize, BenchmarkConfig, BenchmarkError, Session};
use hal::BufferView;
use microbench::State;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use vm::{Function, Value, VariantList};

// ── Type-state markers ─────────────────────────────────────────

/// No call has been made yet.
#[derive(Debug)]
pub struct Cold;

/// The warm-up call succeeded.
#[derive(Debug)]
pub struct Warm;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Cold {}
    impl Sealed for super::Warm {}
}

/// Sealed trait for invocation states.
pub trait InvocationState: sealed::Sealed + std::fmt::Debug {}
impl InvocationState for Cold {}
impl InvocationState for Warm {}

// ── Input checksum ─────────────────────────────────────────────

/// Hashes the identity and contents of every element of `list`.
///
/// Two lists hash equal only if they hold the same objects with the same
/// bytes, so replacing an input or writing into one both change the sum.
pub fn input_checksum(list: &VariantList) -> u64 {
    let mut hasher = DefaultHasher::new();
    list.len().hash(&mut hasher);
    for value in list.iter() {
        match value {
            Value::Ref(r) => {
                r.ref_type().id().hash(&mut hasher);
                r.identity().hash(&mut hasher);
                if let Some(view) = r.downcast_ref::<BufferView>() {
                    view.descriptor().hash(&mut hasher);
                    view.as_bytes().hash(&mut hasher);
                }
            }
            Value::I32(v) => v.hash(&mut hasher),
            Value::I64(v) => v.hash(&mut hasher),
            Value::F32(v) => v.to_bits().hash(&mut hasher),
            Value::F64(v) => v.to_bits().hash(&mut hasher),
        }
    }
    hasher.finish()
}

// ── Invocation ─────────────────────────────────────────────────

/// A resolved, validated function plus its materialized inputs.
pub struct Invocation<'s, S: InvocationState = Cold> {
    session: &'s Session,
    function: Function,
    inputs: VariantList,
    input_descriptors: Vec<Descriptor>,
    output_descriptors: Vec<Descriptor>,
    warm_ups: u32,
    timed_calls: u64,
    _state: PhantomData<S>,
}

impl<'s> Invocation<'s, Cold> {
    /// Resolves `config.entry_function`, checks its ABI and materializes
    /// its inputs from the configured source.
    pub fn prepare(session: &'s Session, config: &BenchmarkConfig) -> Result<Self, BenchmarkError> {
        let name = &config.entry_function;
        let function = session
            .lookup_function(name)
            .with_context(|| format!("looking up function '{name}'"))?;
        validate_function_abi(&function)
            .with_context(|| format!("validating ABI of function '{name}'"))?;

        let input_descriptors = parse_input_signature(&function).context("parsing input signature")?;
        let inputs = materialize::materialize_inputs(
            &input_descriptors,
            &config.inputs,
            config.inputs_file(),
            session.device().allocator(),
        )
        .context("materializing inputs")?;
        let output_descriptors =
            parse_output_signature(&function).context("parsing output signature")?;

        tracing::info!(
            function = %function.qualified_name(),
            inputs = input_descriptors.len(),
            outputs = output_descriptors.len(),
            "invocation prepared"
        );
        Ok(Self::new(
            session,
            function,
            inputs,
            input_descriptors,
            output_descriptors,
        ))
    }

    /// Wraps already-resolved parts. The ABI is not re-checked.
    pub fn new(
        session: &'s Session,
        function: Function,
        inputs: VariantList,
        input_descriptors: Vec<Descriptor>,
        output_descriptors: Vec<Descriptor>,
    ) -> Self {
        Self {
            session,
            function,
            inputs,
            input_descriptors,
            output_descriptors,
            warm_ups: 0,
            timed_calls: 0,
            _state: PhantomData,
        }
    }

    /// Performs the single untimed warm-up call.
    pub fn warm_up(self) -> Result<Invocation<'s, Warm>, BenchmarkError> {
        let outputs = self.call().context("warm-up invocation")?;
        tracing::debug!(
            function = %self.function.qualified_name(),
            outputs = outputs.len(),
            "warm-up complete"
        );
        drop(outputs);
        Ok(Invocation {
            session: self.session,
            function: self.function,
            inputs: self.inputs,
            input_descriptors: self.input_descriptors,
            output_descriptors: self.output_descriptors,
            warm_ups: 1,
            timed_calls: 0,
            _state: PhantomData,
        })
    }
}

impl<'s> Invocation<'s, Warm> {
    /// Runs the timed loop driven by `state`, then verifies that the
    /// shared inputs are unchanged.
    ///
    /// A failed call inside the loop is logged and aborts the process.
    ///
    /// # Errors
    /// [`BenchmarkError::FailedPrecondition`] if the inputs were mutated.
    pub fn run_timed(&mut self, state: &mut State) -> Result<(), BenchmarkError> {
        let before = input_checksum(&self.inputs);
        for _ in state.iter() {
            match self.call() {
                Ok(outputs) => drop(outputs),
                Err(e) => {
                    tracing::error!(
                        function = %self.function.qualified_name(),
                        iteration = self.timed_calls,
                        error = %e,
                        "invocation failed inside the timed loop"
                    );
                    std::process::abort();
                }
            }
            self.timed_calls += 1;
        }
        let after = input_checksum(&self.inputs);
        if before != after {
            return Err(BenchmarkError::FailedPrecondition(format!(
                "function '{}' mutated its inputs during the timed loop",
                self.function.qualified_name()
            )));
        }
        Ok(())
    }

    /// One extra call returning its outputs, outside of any timing.
    pub fn invoke(&self) -> Result<VariantList, BenchmarkError> {
        self.call()
    }
}

impl<'s, S: InvocationState> Invocation<'s, S> {
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn inputs(&self) -> &VariantList {
        &self.inputs
    }

    pub fn input_descriptors(&self) -> &[Descriptor] {
        &self.input_descriptors
    }

    pub fn output_descriptors(&self) -> &[Descriptor] {
        &self.output_descriptors
    }

    pub fn warm_ups(&self) -> u32 {
        self.warm_ups
    }

    pub fn timed_calls(&self) -> u64 {
        self.timed_calls
    }

    /// Invokes with the shared inputs and a fresh output list.
    fn call(&self) -> Result<VariantList, BenchmarkError> {
        let mut outputs = VariantList::with_capacity(self.output_descriptors.len());
        vm::invoke(
            self.session.context(),
            &self.function,
            &self.inputs,
            &mut outputs,
        )?;
        Ok(outputs)
    }
}

impl<S: InvocationState> std::fmt::Debug for Invocation<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("function", &self.function.qualified_name())
            .field("inputs", &self.input_descriptors)
            .field("outputs", &self.output_descriptors)
            .field("warm_ups", &self.warm_ups)
            .field("timed_calls", &self.timed_calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusCode;
    use hal::MemoryBudget;
    use hal_module::as_buffer_view;
    use microbench::CpuClock;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use vm::{ImportScope, Linkage, Module, VmError};

    const MODULE: &str = r#"{
        "name": "simple",
        "imports": ["hal.add", "hal.neg"],
        "functions": [
            {
                "name": "add", "export": true,
                "reflection": {"fv": "1", "inputs": "2x2xi32;2x2xi32", "outputs": "2x2xi32"},
                "num_registers": 3, "num_args": 2,
                "body": [
                    {"op": "call_import", "import": 0, "args": [0, 1], "results": [2]},
                    {"op": "return", "values": [2]}
                ]
            },
            {
                "name": "negate", "export": true,
                "reflection": {"fv": "1", "inputs": "f32", "outputs": "f32"},
                "num_registers": 2, "num_args": 1,
                "body": [
                    {"op": "call_import", "import": 1, "args": [0], "results": [1]},
                    {"op": "return", "values": [1]}
                ]
            },
            {
                "name": "legacy", "export": true,
                "reflection": {"fv": "0"},
                "num_registers": 0, "num_args": 0,
                "body": [{"op": "return", "values": []}]
            },
            {
                "name": "bare", "export": true,
                "num_registers": 0, "num_args": 0,
                "body": [{"op": "return", "values": []}]
            }
        ]
    }"#;

    fn session() -> Session {
        Session::from_bytes(MODULE.as_bytes(), "vmla", MemoryBudget::unlimited()).unwrap()
    }

    const RECORDER_FUNCTIONS: [&str; 2] = ["tick", "flaky"];

    /// Native module counting its calls. `tick` always succeeds; `flaky`
    /// succeeds only when it is the first call the module sees.
    #[derive(Default)]
    struct Recorder {
        calls: AtomicU64,
    }

    impl Recorder {
        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Module for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn imports(&self) -> &[String] {
            &[]
        }

        fn function_count(&self) -> usize {
            RECORDER_FUNCTIONS.len()
        }

        fn lookup_function(&self, _linkage: Linkage, name: &str) -> Option<usize> {
            RECORDER_FUNCTIONS.iter().position(|f| *f == name)
        }

        fn function_name(&self, ordinal: usize) -> Option<&str> {
            RECORDER_FUNCTIONS.get(ordinal).copied()
        }

        fn reflection_attr(&self, _ordinal: usize, key: &str) -> Option<&str> {
            (key == "fv").then_some("1")
        }

        fn invoke(
            &self,
            ordinal: usize,
            _args: &[Value],
            _imports: &ImportScope<'_>,
        ) -> Result<Vec<Value>, VmError> {
            let previous = self.calls.fetch_add(1, Ordering::SeqCst);
            if RECORDER_FUNCTIONS[ordinal] == "flaky" && previous > 0 {
                return Err(VmError::TypeMismatch {
                    expected: "first call".into(),
                    actual: format!("call {}", previous + 1),
                });
            }
            Ok(Vec::new())
        }
    }

    fn recorder_session() -> (Session, Arc<Recorder>) {
        let mut s = session();
        let recorder = Arc::new(Recorder::default());
        let module: Arc<dyn Module> = recorder.clone();
        s.register_modules(&[module]).unwrap();
        (s, recorder)
    }

    fn recorder_invocation<'s>(
        s: &'s Session,
        recorder: &Arc<Recorder>,
        name: &str,
    ) -> Invocation<'s, Cold> {
        let module: Arc<dyn Module> = recorder.clone();
        let function = Function::lookup(&module, Linkage::Export, name).unwrap();
        Invocation::new(s, function, VariantList::with_capacity(0), Vec::new(), Vec::new())
    }

    fn config(function: &str, inputs: &[&str]) -> BenchmarkConfig {
        BenchmarkConfig {
            input_file: Some(PathBuf::from("unused.json")),
            entry_function: function.into(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_end_to_end() {
        let s = session();
        let cold = Invocation::prepare(&s, &config("add", &["2x2xi32=1 2 3 4", "2x2xi32=5 6 7 8"]))
            .unwrap();
        assert_eq!(cold.warm_ups(), 0);
        let warm = cold.warm_up().unwrap();
        assert_eq!(warm.warm_ups(), 1);
        assert_eq!(warm.timed_calls(), 0);

        let outputs = warm.invoke().unwrap();
        let view = as_buffer_view(outputs.get(0).unwrap()).unwrap();
        assert_eq!(view.to_vec::<i32>().unwrap(), vec![6, 8, 10, 12]);
    }

    #[test]
    fn test_timed_loop_counts_and_keeps_inputs() {
        let s = session();
        let mut warm = Invocation::prepare(&s, &config("negate", &["f32=2.5"]))
            .unwrap()
            .warm_up()
            .unwrap();
        let before = input_checksum(warm.inputs());

        let mut state = State::new(7, CpuClock::Process);
        warm.run_timed(&mut state).unwrap();

        assert_eq!(warm.warm_ups(), 1);
        assert_eq!(warm.timed_calls(), 7);
        assert_eq!(state.iterations(), 7);
        assert_eq!(input_checksum(warm.inputs()), before);
    }

    #[test]
    fn test_single_warm_up_precedes_timed_calls() {
        let (s, recorder) = recorder_session();
        let cold = recorder_invocation(&s, &recorder, "tick");
        assert_eq!(recorder.calls(), 0);

        let mut warm = cold.warm_up().unwrap();
        assert_eq!(recorder.calls(), 1);

        let mut state = State::new(5, CpuClock::Process);
        assert!(!state.started());
        warm.run_timed(&mut state).unwrap();
        assert!(state.finished());
        assert_eq!(recorder.calls(), 1 + 5);
        assert_eq!(warm.warm_ups(), 1);
        assert_eq!(warm.timed_calls(), 5);
    }

    #[test]
    fn test_warm_up_call_is_not_timed() {
        let (s, recorder) = recorder_session();
        // `flaky` fails on any call after the first, so a second untimed
        // call would make the timed loop abort.
        let mut warm = recorder_invocation(&s, &recorder, "flaky").warm_up().unwrap();
        assert_eq!(recorder.calls(), 1);
        assert_eq!(warm.timed_calls(), 0);
        warm.run_timed(&mut State::new(0, CpuClock::Process)).unwrap();
        assert_eq!(recorder.calls(), 1);
    }

    const TIMED_FAILURE_CHILD: &str = "MODULE_BENCH_TIMED_FAILURE_CHILD";

    #[test]
    fn test_timed_failure_aborts_process() {
        if std::env::var_os(TIMED_FAILURE_CHILD).is_some() {
            let (s, recorder) = recorder_session();
            let mut warm = recorder_invocation(&s, &recorder, "flaky").warm_up().unwrap();
            let _ = warm.run_timed(&mut State::new(3, CpuClock::Process));
            // Reaching here means the failure was swallowed.
            std::process::exit(0);
        }

        let output = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "invocation::tests::test_timed_failure_aborts_process",
                "--exact",
                "--test-threads=1",
                "--nocapture",
            ])
            .env(TIMED_FAILURE_CHILD, "1")
            .output()
            .unwrap();
        assert!(!output.status.success(), "{output:?}");
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            assert_eq!(output.status.signal(), Some(libc::SIGABRT), "{output:?}");
        }
    }

    #[test]
    fn test_outputs_are_released_each_call() {
        let s = session();
        let mut warm = Invocation::prepare(&s, &config("add", &["2x2xi32=1", "2x2xi32=2"]))
            .unwrap()
            .warm_up()
            .unwrap();
        let inputs_bytes = s.device().allocator().live_bytes();
        warm.run_timed(&mut State::new(10, CpuClock::Process)).unwrap();
        assert_eq!(s.device().allocator().live_bytes(), inputs_bytes);
    }

    #[test]
    fn test_checksum_tracks_identity_and_contents() {
        let s = session();
        let alloc = s.device().allocator();
        let descs = crate::signature::parse_signature("2xi32").unwrap();
        let entries = ["2xi32=1 2".to_string()];
        let a = materialize::materialize_inputs(&descs, &entries, None, alloc).unwrap();
        let b = materialize::materialize_inputs(&descs, &entries, None, alloc).unwrap();
        assert_eq!(input_checksum(&a), input_checksum(&a));
        // Same values, different objects.
        assert_ne!(input_checksum(&a), input_checksum(&b));
    }

    #[test]
    fn test_lookup_and_abi_failures_name_the_step() {
        let s = session();
        let err = Invocation::prepare(&s, &config("missing", &[])).unwrap_err();
        assert_eq!(err.code(), StatusCode::NotFound);
        assert_eq!(err.step(), Some("looking up function 'missing'"));

        let err = Invocation::prepare(&s, &config("legacy", &[])).unwrap_err();
        assert_eq!(err.code(), StatusCode::Unimplemented);

        let err = Invocation::prepare(&s, &config("bare", &[])).unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }

    #[test]
    fn test_missing_inputs() {
        let s = session();
        let err = Invocation::prepare(&s, &config("add", &[])).unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
        assert_eq!(err.step(), Some("materializing inputs"));
    }

    #[test]
    fn test_warm_up_failure_propagates() {
        let s = session();
        let function = s.lookup_function("add").unwrap();
        let descs = crate::signature::parse_signature("2xi32;3xi32").unwrap();
        let entries: Vec<String> = vec!["2xi32=1 2".into(), "3xi32=1 2 3".into()];
        let inputs =
            materialize::materialize_inputs(&descs, &entries, None, s.device().allocator()).unwrap();
        let cold = Invocation::new(&s, function, inputs, descs, Vec::new());
        let err = cold.warm_up().unwrap_err();
        assert_eq!(err.step(), Some("warm-up invocation"));
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }
}
