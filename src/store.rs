use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::models::{Student, StudentChanges};

pub const DATABASE_NAME: &str = "pbscybsec";
pub const COLLECTION_NAME: &str = "students";

/// Upper bound on any single round trip to the store.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(10);

pub type SharedStore = Arc<dyn StudentStore>;

/// Persistence for student records, keyed by the string identifier.
///
/// Implementations are shared between all in-flight requests.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// All stored students in store order. Records that fail to decode are
    /// skipped.
    async fn list(&self) -> anyhow::Result<Vec<Student>>;

    async fn get(&self, id: &str) -> anyhow::Result<Option<Student>>;

    async fn insert(&self, student: &Student) -> anyhow::Result<()>;

    /// Overwrites name, email and password of the matching record. Matching
    /// nothing is not an error.
    async fn update(&self, id: &str, changes: &StudentChanges) -> anyhow::Result<()>;

    /// Matching nothing is not an error.
    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}

/// On-disk shape of a student; the identifier lives in `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StudentDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    password: String,
}

impl From<&Student> for StudentDocument {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            email: student.email.clone(),
            password: student.password.clone(),
        }
    }
}

impl From<StudentDocument> for Student {
    fn from(doc: StudentDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            password: doc.password,
        }
    }
}

/// Decodes one raw document from a listing. Undecodable documents are logged
/// and dropped.
fn decode_listed(raw: Document) -> Option<Student> {
    match bson::from_document::<StudentDocument>(raw) {
        Ok(doc) => Some(Student::from(doc)),
        Err(err) => {
            log::warn!("Skipping undecodable student document: {}", err);
            None
        }
    }
}

async fn bounded<T, F>(what: &'static str, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(STORE_TIMEOUT, fut).await {
        Ok(res) => res.map_err(anyhow::Error::from),
        Err(_) => Err(anyhow!("{} timed out after {:?}", what, STORE_TIMEOUT)),
    }
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    collection: Collection<StudentDocument>,
}

impl MongoStore {
    /// Connects to `uri` and verifies the deployment answers a ping.
    pub async fn connect(uri: &str) -> anyhow::Result<MongoStore> {
        let options = ClientOptions::parse(uri)
            .await
            .context("Invalid MONGODB_URI")?;
        let client = Client::with_options(options).context("Could not create store client")?;
        let db = client.database(DATABASE_NAME);
        bounded("ping", db.run_command(doc! { "ping": 1 }, None))
            .await
            .context("Could not reach the store")?;
        Ok(MongoStore {
            collection: db.collection(COLLECTION_NAME),
        })
    }
}

#[async_trait]
impl StudentStore for MongoStore {
    async fn list(&self) -> anyhow::Result<Vec<Student>> {
        let raw = self.collection.clone_with_type::<Document>();
        let mut cursor = bounded("find", raw.find(doc! {}, None)).await?;
        let mut students = Vec::new();
        while bounded("cursor", cursor.advance()).await? {
            let current = cursor.deserialize_current()?;
            students.extend(decode_listed(current));
        }
        Ok(students)
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Student>> {
        let found = bounded("find_one", self.collection.find_one(doc! { "_id": id }, None)).await?;
        Ok(found.map(Student::from))
    }

    async fn insert(&self, student: &Student) -> anyhow::Result<()> {
        let doc = StudentDocument::from(student);
        bounded("insert_one", self.collection.insert_one(doc, None)).await?;
        Ok(())
    }

    async fn update(&self, id: &str, changes: &StudentChanges) -> anyhow::Result<()> {
        let update = doc! {
            "$set": {
                "name": changes.name.as_str(),
                "email": changes.email.as_str(),
                "password": changes.password.as_str(),
            }
        };
        bounded(
            "update_one",
            self.collection.update_one(doc! { "_id": id }, update, None),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        bounded("delete_one", self.collection.delete_one(doc! { "_id": id }, None)).await?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;


#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn documents_store_the_id_under_underscore_id() {
        let student = Student {
            id: "0123456789abcdef01234567".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let doc = bson::to_document(&StudentDocument::from(&student)).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), student.id);
        assert!(doc.get("id").is_none());

        let back: StudentDocument = bson::from_document(doc).unwrap();
        assert_eq!(Student::from(back), student);
    }

    #[test]
    fn listing_skips_undecodable_documents() {
        let good = doc! {
            "_id": "0123456789abcdef01234567",
            "name": "Ada",
            "email": "ada@example.com",
            "password": "hunter2",
        };
        let missing_password = doc! {
            "_id": "111111111111111111111111",
            "name": "Grace",
            "email": "grace@example.com",
        };
        let numeric_id = doc! {
            "_id": 42,
            "name": "Linus",
            "email": "linus@example.com",
            "password": "pw",
        };

        let students: Vec<Student> = vec![missing_password, good, numeric_id]
            .into_iter()
            .filter_map(decode_listed)
            .collect();
        assert_eq!(
            students,
            vec![Student {
                id: "0123456789abcdef01234567".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "hunter2".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn memory_store_update_and_delete_ignore_missing_ids() {
        let store = MemoryStore::default();
        let changes = StudentChanges::default();
        store.update("missing", &changes).await.unwrap();
        store.delete("missing").await.unwrap();
        assert_eq!(store.len().await, 0);
    }
}
