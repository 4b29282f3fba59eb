//! Built-in function classes.
//!
//! Each type here describes one class of functions over which the worst
//! case is taken and implements
//! [`FunctionClass`](crate::FunctionClass) by emitting the interpolation
//! constraints that are necessary *and sufficient* for a set of recorded
//! oracle samples to be extendable to an actual member of the class. Tight
//! worst-case bounds depend on that sufficiency; a merely necessary set of
//! conditions would only give an upper estimate.
//!
//! Class parameters are plain options carried by the value itself, so two
//! functions of the same class with different parameters coexist in one
//! problem without any shared state.

mod convex;
mod convex_indicator;
mod smooth;
mod smooth_strongly_convex;

pub use convex::Convex;
pub use convex_indicator::ConvexIndicator;
pub use smooth::Smooth;
pub use smooth_strongly_convex::SmoothStronglyConvex;
