mod inmemory;
mod postgres;

pub use inmemory::InMemoryExamRepo;
pub use postgres::PostgresExamRepo;

use campus_scheduler_domain::{Exam, ID};

#[async_trait::async_trait]
pub trait IExamRepo: Send + Sync {
    async fn insert(&self, exam: &Exam) -> anyhow::Result<()>;
    async fn save(&self, exam: &Exam) -> anyhow::Result<()>;
    async fn find(&self, exam_id: &ID) -> anyhow::Result<Option<Exam>>;
    async fn delete(&self, exam_id: &ID) -> anyhow::Result<Option<Exam>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn crud() {
        let repo = InMemoryExamRepo::new();
        let mut exam = Exam::new(ID::default(), "Discrete mathematics", 1000);

        repo.insert(&exam).await.expect("To insert exam");
        assert!(repo.find(&exam.id).await.unwrap().is_some());

        exam.start_ts = 5000;
        repo.save(&exam).await.unwrap();
        let found = repo.find(&exam.id).await.unwrap().expect("To find exam");
        assert_eq!(found.start_ts, 5000);

        let deleted = repo.delete(&exam.id).await.unwrap().expect("To delete exam");
        assert_eq!(deleted.course, "Discrete mathematics");
        assert!(repo.find(&exam.id).await.unwrap().is_none());
    }
}
