use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize)]
pub enum SplitLedgerError {
    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(Uuid),

    /// Group is archived and cannot accept the operation
    #[error("Group {0} is archived")]
    GroupArchived(Uuid),

    /// User is not an active member of the group
    #[error("User {0} is not a group member")]
    NotGroupMember(Uuid),

    /// User is already an active member of the group
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(Uuid),

    /// User lacks the admin role required for the operation
    #[error("User {0} is not authorized to {1}")]
    NotAuthorized(Uuid, String),

    /// Member record not found in the group
    #[error("Member {0} not found")]
    MemberNotFound(Uuid),

    /// Invite code does not match any group
    #[error("Invalid invite code")]
    InvalidInviteCode,

    /// Group still has unsettled balances
    #[error("Group {0} still has unsettled balances")]
    GroupHasDebt(Uuid),

    /// Member still owes or is owed money in the group
    #[error("Member {member} has an unsettled balance of {balance}")]
    MemberHasDebt {
        member: Uuid,
        balance: rust_decimal::Decimal,
    },

    /// The only remaining admin tried to leave
    #[error("The last admin cannot leave the group")]
    CannotLeaveAsAdmin,

    /// Admin tried to remove themselves
    #[error("Cannot remove yourself from the group")]
    CannotRemoveSelf,

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Expense has already been soft-deleted
    #[error("Expense {0} already deleted")]
    ExpenseAlreadyDeleted(Uuid),

    /// Cannot settle a debt with yourself
    #[error("Cannot create settlement to self")]
    SelfSettlement,

    /// Amount is zero, negative or exceeds the currency's precision
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Split amounts don't add up to the expense amount
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Storage error: {0}")]
    StorageError(String),
}
