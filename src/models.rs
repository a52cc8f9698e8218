use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

/// Length in bytes of a student identifier before hex encoding.
pub const STUDENT_ID_BYTES: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body accepted by both create and update. Absent fields decode as empty
/// strings and any client supplied `id` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudentChanges {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl StudentChanges {
    pub fn into_student(self, id: String) -> Student {
        Student {
            id,
            name: self.name,
            email: self.email,
            password: self.password,
        }
    }
}

/// Generates a fresh identifier: 12 random bytes rendered as lowercase hex.
pub fn new_student_id() -> String {
    let bytes: [u8; STUDENT_ID_BYTES] = thread_rng().gen();
    hex::encode(bytes)
}

/// Checks that `raw` is a well-formed identifier, i.e. exactly 24 hex digits.
/// The id is returned as given so every operation filters by the same string.
pub fn parse_student_id(raw: &str) -> Option<&str> {
    let bytes = hex::decode(raw).ok()?;
    if bytes.len() != STUDENT_ID_BYTES {
        return None;
    }
    Some(raw)
}
