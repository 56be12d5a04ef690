pub mod audit;
pub mod expense;
pub mod group;
pub mod member;
pub mod page;
pub mod snapshot;
pub mod split;

pub use audit::{ActivityAction, ActivityLog, EntityType};
pub use expense::{Expense, ExpenseCategory};
pub use group::Group;
pub use member::{GroupRole, Member};
pub use page::{Page, PageRequest};
pub use snapshot::GroupSnapshot;
pub use split::Split;
