//! Identifiers for correlating client activity in logs.

use uuid::Uuid;

/// Length of an operation ID.
pub const OPERATION_ID_LEN: usize = 8;

pub struct IdGenerator;

impl IdGenerator {
    /// Full UUID sent with each API request as `x-request-id`.
    pub fn request_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Short hex label tying together the start and settle log lines of one
    /// store operation.
    pub fn operation_id() -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(OPERATION_ID_LEN);
        id
    }
}
