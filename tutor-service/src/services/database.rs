//! Conversation store adapter.
//!
//! Sole reader/writer of conversation documents. Each conversation is a
//! single MongoDB document embedding its message history, so deleting a
//! conversation together with all its messages is one atomic write.

use crate::models::{Conversation, ConversationMetadata, Part, Role, StoredMessage};
use chrono::Utc;
use mongodb::{
    bson::doc,
    options::{IndexOptions, UpdateOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct ConversationDb {
    client: MongoClient,
    db: Database,
}

impl ConversationDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        // Index on created_at for time-based cleanup
        let created_at_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_idx".to_string())
                    .build(),
            )
            .build();

        self.conversations()
            .create_index(created_at_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create created_at index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn conversations(&self) -> Collection<Conversation> {
        self.db.collection("conversations")
    }

    /// Idempotent upsert of the conversation record. `$setOnInsert` leaves
    /// `created_at` untouched on repeat calls.
    pub async fn ensure_conversation(&self, session_id: &str) -> Result<(), AppError> {
        self.conversations()
            .update_one(
                doc! { "_id": session_id },
                doc! {
                    "$setOnInsert": {
                        "created_at": Utc::now().timestamp_millis(),
                        "messages": [],
                        "message_count": 0
                    }
                },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to ensure conversation exists: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    /// Append a new message with a fresh server timestamp. Existing messages
    /// are never mutated; ordering across concurrent appends is whatever the
    /// server observed, so callers await each append before the next.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        parts: Vec<Part>,
    ) -> Result<StoredMessage, AppError> {
        let message = StoredMessage::new(role, parts);
        let message_doc = mongodb::bson::to_bson(&message).map_err(|e| {
            tracing::error!("Failed to serialize message: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        self.conversations()
            .update_one(
                doc! { "_id": session_id },
                doc! {
                    "$push": { "messages": message_doc },
                    "$inc": { "message_count": 1 }
                },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to append message: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(message)
    }

    /// Full ordered history, ascending by timestamp (stable, total). Returns
    /// an empty sequence when the conversation does not exist.
    pub async fn list_messages(&self, session_id: &str) -> Result<Vec<StoredMessage>, AppError> {
        let conversation = self
            .conversations()
            .find_one(doc! { "_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch conversation: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let mut messages = match conversation {
            Some(c) => c.messages,
            None => return Ok(Vec::new()),
        };
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    /// Delete the conversation and all its messages in one atomic write.
    /// Fails with NotFound when the conversation does not exist.
    pub async fn delete_conversation(&self, session_id: &str) -> Result<(), AppError> {
        let result = self
            .conversations()
            .delete_one(doc! { "_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete conversation: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Conversation not found")));
        }
        Ok(())
    }

    /// Derived, informational read; not on the request hot path.
    pub async fn metadata(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationMetadata>, AppError> {
        let conversation = self
            .conversations()
            .find_one(doc! { "_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch conversation metadata: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(conversation.map(|c| {
            let last_activity = c.messages.iter().map(|m| m.timestamp).max();
            ConversationMetadata {
                session_id: c.session_id,
                created_at: c.created_at,
                message_count: c.message_count,
                last_activity,
            }
        }))
    }
}
