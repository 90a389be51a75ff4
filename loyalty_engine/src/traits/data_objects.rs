use crate::db_types::Order;

/// The outcome of inserting an order whose number must be globally unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order was created with status `NEW`.
    Inserted(Order),
    /// An order with the same number already exists (possibly owned by someone else). This is the row that won.
    AlreadyExists(Order),
}

impl InsertOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            InsertOrderResult::Inserted(o) | InsertOrderResult::AlreadyExists(o) => o,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOrderResult::Inserted(_))
    }
}
