// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed dense integer handles and the registries that allocate them.
//!
//! Every long-lived object in the engine is addressed by a 32-bit handle of a
//! distinct kind. Handles of different kinds are not interchangeable, and each
//! kind has a null sentinel (`u32::MAX`). The [`IdRegistry`] allocates handles
//! densely and recycles freed slots; the [`PairKeyedIdTree`] extends it with
//! child allocation keyed by an unordered pair of parents.

mod pair_tree;
mod registry;

pub use pair_tree::{pair_key, PairKeyedIdTree};
pub use registry::IdRegistry;

/// A 32-bit handle of a specific kind.
///
/// Implemented by the newtypes declared with [`define_id!`](crate::define_id).
/// The trait exists so the registries can stay generic without caring which
/// subsystem a handle belongs to.
pub trait Handle: Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug {
    /// The kind name, used in error messages.
    const KIND: &'static str;

    /// The null sentinel of this kind.
    const NULL: Self;

    /// Builds a handle from a raw slot index.
    fn from_index(index: u32) -> Self;

    /// Returns the raw slot index.
    fn index(self) -> u32;

    /// Returns true if this handle is the null sentinel.
    fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// Declares a `#[repr(transparent)]` `u32` handle newtype implementing
/// [`Handle`].
///
/// ```
/// orbita_core::define_id! {
///     /// Identifies a widget.
///     pub struct WidgetId
/// }
///
/// use orbita_core::id::Handle;
/// let id = WidgetId::from_index(3);
/// assert_eq!(id.index(), 3);
/// assert!(WidgetId::NULL.is_null());
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        $vis struct $name(u32);

        impl $name {
            /// The null sentinel of this kind.
            pub const NULL: Self = Self(u32::MAX);
        }

        impl $crate::id::Handle for $name {
            const KIND: &'static str = stringify!($name);
            const NULL: Self = Self::NULL;

            fn from_index(index: u32) -> Self {
                Self(index)
            }

            fn index(self) -> u32 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                if self.0 == u32::MAX {
                    write!(f, concat!(stringify!($name), "(null)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }
    };
}
