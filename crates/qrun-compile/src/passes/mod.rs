//! Built-in decomposition passes.
//!
//! Passes run in pipeline order: [`TrivialLayout`], [`BasisTranslation`],
//! [`BasicRouting`], [`NativeVerification`].

pub mod layout;
pub mod routing;
pub mod translation;
pub mod verification;

pub use layout::TrivialLayout;
pub use routing::BasicRouting;
pub use translation::{BasisTranslation, translate};
pub use verification::{NativeVerification, verify_native};
