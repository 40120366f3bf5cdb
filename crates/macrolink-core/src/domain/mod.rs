//! Domain entities for macrolink.
//!
//! Pure data types with no I/O: the canonical [`hotkey::Hotkey`], the
//! [`action::Action`] steps a macro performs, the [`macros::Macro`] entity,
//! and the [`transaction::Transaction`] records that describe how the macro
//! table changed.  Everything here can be unit-tested without a runtime.

pub mod action;
pub mod hotkey;
pub mod macros;
pub mod transaction;
