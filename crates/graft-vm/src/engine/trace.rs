//! Execution tracing.
//!
//! The tracer is a generic parameter of the execute loop, so `NoopTracer`
//! calls compile away entirely while `PrintTracer` gives a line-per-event
//! account of a run for debugging.

use graft_bytecode::Instruction;

/// Observer of engine execution events. All methods default to no-ops.
pub trait Tracer {
    fn trace_instruction(&mut self, index: usize, instruction: &Instruction) {
        let _ = (index, instruction);
    }

    /// An instance was constructed and its scope opened.
    fn trace_define(&mut self, id: &str) {
        let _ = id;
    }

    /// A reference to `target` could not be written yet and was dispatched.
    fn trace_defer(&mut self, target: &str) {
        let _ = target;
    }

    /// `target`'s scope closed; `resolved` dispatched references landed.
    fn trace_close(&mut self, target: &str, resolved: usize) {
        let _ = (target, resolved);
    }
}

/// Tracer that does nothing; optimized away at compile time.
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Tracer that prints each event to stderr.
pub struct PrintTracer;

impl Tracer for PrintTracer {
    fn trace_instruction(&mut self, index: usize, instruction: &Instruction) {
        eprintln!("[{index:4}] {instruction}");
    }

    fn trace_define(&mut self, id: &str) {
        eprintln!("       define {id}");
    }

    fn trace_defer(&mut self, target: &str) {
        eprintln!("       defer -> {target}");
    }

    fn trace_close(&mut self, target: &str, resolved: usize) {
        eprintln!("       close {target} ({resolved} deferred resolved)");
    }
}
