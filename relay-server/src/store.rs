//! Testimonial records and their storage.
//!
//! Records live for the lifetime of the process. The [`TestimonialStore`]
//! trait is the only thing the pipeline sees, so a persistent backend can
//! replace [`InMemoryTestimonialStore`] without touching handlers.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A submitted review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    /// Review text
    pub text: String,
    /// Display name, with location appended when given
    pub author: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

impl Testimonial {
    pub fn new(
        name: &str,
        location: Option<&str>,
        review: &str,
        rating: f64,
        approved: bool,
    ) -> Self {
        let author = match location {
            Some(location) => format!("{name}, {location}"),
            None => name.to_string(),
        };

        Self {
            id: Uuid::now_v7(),
            text: review.to_string(),
            author,
            rating,
            created_at: Utc::now(),
            approved,
        }
    }
}

#[async_trait]
pub trait TestimonialStore: Send + Sync {
    /// Insert a record ahead of everything already stored.
    async fn insert(&self, testimonial: Testimonial);

    /// Approved records, most recently submitted first.
    async fn list_approved(&self) -> Vec<Testimonial>;

    /// Mark a record approved, returning it. `None` if the id is unknown.
    async fn approve(&self, id: Uuid) -> Option<Testimonial>;
}

/// Unbounded in-memory store.
#[derive(Default)]
pub struct InMemoryTestimonialStore {
    records: RwLock<VecDeque<Testimonial>>,
}

impl InMemoryTestimonialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TestimonialStore for InMemoryTestimonialStore {
    async fn insert(&self, testimonial: Testimonial) {
        self.records.write().await.push_front(testimonial);
    }

    async fn list_approved(&self) -> Vec<Testimonial> {
        self.records
            .read()
            .await
            .iter()
            .filter(|t| t.approved)
            .cloned()
            .collect()
    }

    async fn approve(&self, id: Uuid) -> Option<Testimonial> {
        let mut records = self.records.write().await;
        let record = records.iter_mut().find(|t| t.id == id)?;
        record.approved = true;
        Some(record.clone())
    }
}
