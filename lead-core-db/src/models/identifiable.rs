use uuid::Uuid;

/// Entities stored under a UUID primary key
pub trait Identifiable {
    fn get_id(&self) -> Uuid;
}
