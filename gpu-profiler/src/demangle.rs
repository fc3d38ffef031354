//! Kernel symbol demangling
//!
//! Demangling never fails the caller: a symbol that cannot be demangled is
//! returned as-is.

use symbolic_common::Name;
use symbolic_demangle::{Demangle, DemangleOptions};
use tracing::debug;

/// Turns a possibly mangled kernel symbol into a readable name
pub trait Demangler: Send + Sync {
    fn demangle(&self, mangled: &str) -> String;
}

/// Demangler backed by `symbolic`, keeping return types and parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicDemangler;

impl Demangler for SymbolicDemangler {
    fn demangle(&self, mangled: &str) -> String {
        match Name::from(mangled).demangle(DemangleOptions::complete()) {
            Some(demangled) => demangled,
            None => {
                debug!("Symbol {:?} could not be demangled, using it verbatim", mangled);
                mangled.to_string()
            }
        }
    }
}

/// Demangler for traces whose names are already readable
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDemangler;

impl Demangler for PassthroughDemangler {
    fn demangle(&self, mangled: &str) -> String {
        mangled.to_string()
    }
}
