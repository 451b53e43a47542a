//! Query operations for the fluent API.
//!
//! Every read here consults the tenant context when it is executed (or when
//! its SQL is built), never when the builder is created:
//! - `FindManyOperation` - Find multiple records
//! - `FindFirstOperation` - Find the first matching record
//! - `FindUniqueOperation` - Find at most one record
//! - `FindOneOperation` - Find exactly one record
//! - `FindByIdOperation` - Load by primary key, then check ownership
//! - `CountOperation` - Count matching records
//! - `PaginateOperation` - One page plus the matching total
//! - `CreateOperation` - Insert a record, stamping the active tenant

mod count;
mod create;
mod find_by_id;
mod find_first;
mod find_many;
mod find_unique;
mod paginate;

#[cfg(test)]
pub(crate) mod fixtures;

pub use count::CountOperation;
pub use create::CreateOperation;
pub use find_by_id::FindByIdOperation;
pub use find_first::FindFirstOperation;
pub use find_many::FindManyOperation;
pub use find_unique::{FindOneOperation, FindUniqueOperation};
pub use paginate::{DEFAULT_MAX_PER_PAGE, DEFAULT_PER_PAGE, PaginateOperation};
