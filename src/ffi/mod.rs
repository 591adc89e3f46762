//! The Arrow C Data Interface boundary: ABI structs, owned exports, and
//! shareable handles to moved-out columns.

pub mod abi;
pub mod buffer;
pub mod export;
pub mod handle;
pub mod layout;

#[cfg(test)]
mod tests;

pub use abi::{ArrowArray, ArrowSchema};
pub use buffer::AlignedBuffer;
pub use export::{copy_schema, ArrayBuilder, SchemaBuilder};
pub use handle::ArrayHandle;
pub use layout::{DayTimeSlot, MonthDayNanoSlot};
