//! Canonical ordering of the interface representation.
//!
//! Output must not depend on the order of input files or of declarations
//! within them. [`SortedIr`] is the only form emitters accept, so every
//! emitter sees interfaces sorted by qualified name and members sorted by
//! name. Arguments keep their declaration order because it is significant.

use crate::ir::{InterfaceInfo, InterfaceIr};

/// Interfaces in canonical order.
#[derive(Debug, Clone, Default)]
pub struct SortedIr {
    interfaces: Vec<InterfaceInfo>,
}

impl SortedIr {
    /// Sorts a built representation.
    #[must_use]
    pub fn from_ir(ir: InterfaceIr) -> Self {
        let mut interfaces = ir.interfaces;
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        for interface in &mut interfaces {
            interface.methods.sort_by(|a, b| a.name.cmp(&b.name));
            interface.signals.sort_by(|a, b| a.name.cmp(&b.name));
            interface.properties.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Self { interfaces }
    }

    /// Returns the interfaces in canonical order.
    #[must_use]
    pub fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }

    /// Returns true if there are no interfaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

impl From<InterfaceIr> for SortedIr {
    fn from(ir: InterfaceIr) -> Self {
        Self::from_ir(ir)
    }
}
