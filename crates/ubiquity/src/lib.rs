//! # Ubiquity - Object-to-Object Mapping with Compiled Routines
//!
//! Ubiquity copies the properties of a source instance into a new instance of
//! a target type, recursively handling nested objects, optional values and
//! collections. It does so without hand-written per-type copy code and without
//! walking properties by name on every call.
//!
//! The first time a `(source type, target type)` pair is mapped, the engine
//! derives a [`PropertyPlan`](plan::PropertyPlan) for the pair and compiles it
//! into a [`Routine`](routine::Routine): a list of closures specialized for
//! each property. The routine is cached under a
//! [`TypePairKey`](key::TypePairKey) and reused by every later call, from any
//! thread.
//!
//! ## Key Features
//!
//! - **Compiled Routines**: One routine per type pair, built once and reused
//! - **Thread-Safe Cache**: At most one build per pair, even under concurrent
//!   first calls
//! - **Nested Graphs**: Nested objects, `Option<T>`, `Vec<T>` and
//!   `VecDeque<T>` are copied recursively, each nested pair through its own
//!   cached routine
//! - **Self-Referential Types**: Handled through forward references, or
//!   rejected with [`CyclicTypeError`] if so configured
//! - **Graceful Degradation**: Unmatched or incompatible properties are
//!   skipped, never reported as errors
//! - **Converters**: User-registered rules for properties whose types differ
//!
//! ## Mapper Lifecycle
//!
//! 1. **Derive**: Add `#[derive(Mappable)]` to the source and target types
//! 2. **Create**: Instantiate a [`Mapper`]
//! 3. **Register**: Optionally add converters via
//!    [`register_converter`](Mapper::register_converter)
//! 4. **Share**: Wrap in `Arc<Mapper>` (or keep a `static`) for shared use
//! 5. **Map**: Call [`map`](Mapper::map) from any thread
//!
//! ## Example
//!
//! ```ignore
//! use ubiquity::{Mappable, Mapper};
//!
//! #[derive(Debug, Clone, Default, PartialEq, Mappable)]
//! struct ReferenceObject {
//!     id: i64,
//!     label: String,
//!     code: String,
//! }
//!
//! #[derive(Debug, Clone, Default, PartialEq, Mappable)]
//! struct Order {
//!     id: i64,
//!     order_type: Option<ReferenceObject>,
//!     products: Vec<ReferenceObject>,
//! }
//!
//! let mapper = Mapper::new();
//! let order = Order { id: 200, ..Order::default() };
//! let copy: Order = mapper.map(&order)?;
//! assert_eq!(copy, order);
//! ```
//!
//! ## Thread Safety
//!
//! - `&Mapper`: Safe to share across threads for mapping
//! - `&mut Mapper`: Required for converter registration
//!
//! For more examples, see the `integration_test` crate.

extern crate self as ubiquity;

mod cache;

pub mod config;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod key;
pub mod mapper;
pub mod plan;
pub mod routine;
pub mod statistics;

pub use config::{Config, CyclePolicy, DefaultConfig};
pub use descriptor::{Mappable, Object, Property, TypeHandle};
pub use error::{
    ConstructionError, CyclicTypeError, MapError, NullSourceError,
    TypeMismatchError,
};
pub use key::TypePairKey;
pub use mapper::Mapper;
pub use statistics::StatisticsSnapshot;
pub use ubiquity_derive::Mappable;
