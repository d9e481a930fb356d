//! Derive macro for the dungeon DSL
//!
//! `#[derive(DslType)]` makes a struct with named fields visible to DSL code
//! as an aggregate type. It generates the accessor table consumed by the
//! type builder and the conversions to and from DSL values.

use proc_macro::TokenStream;

mod dsl_type;

/// Derive `DslType` and `HostValue` for a struct with named fields.
///
/// The struct must also implement `Default`; instantiation starts from the
/// default and copies every member set in DSL code.
///
/// # Attributes
///
/// - `#[dsl(name = "...")]` on the struct - DSL type name (default: the
///   struct name in snake_case)
/// - `#[dsl(member)]` - field is a DSL member
/// - `#[dsl(member, name = "...")]` - member with an explicit DSL name
/// - `#[dsl(member, readonly)]` - member DSL code can read but not set
/// - `#[dsl(callback)]` - field holds a callback slot DSL code can set
///
/// Fields without a `dsl` attribute are invisible to the DSL.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, DslType)]
/// #[dsl(name = "quest_config")]
/// pub struct QuestConfig {
///     #[dsl(member, name = "points")]
///     quest_points: i64,
///     #[dsl(callback)]
///     on_complete: Option<Runnable>,
/// }
/// ```
#[proc_macro_derive(DslType, attributes(dsl))]
pub fn derive_dsl_type(input: TokenStream) -> TokenStream {
    dsl_type::derive_dsl_type_impl(input)
}
