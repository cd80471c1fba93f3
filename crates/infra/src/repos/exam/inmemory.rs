use super::IExamRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_scheduler_domain::{Exam, ID};

pub struct InMemoryExamRepo {
    exams: std::sync::Mutex<Vec<Exam>>,
}

impl InMemoryExamRepo {
    pub fn new() -> Self {
        Self {
            exams: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IExamRepo for InMemoryExamRepo {
    async fn insert(&self, exam: &Exam) -> anyhow::Result<()> {
        insert(exam, &self.exams);
        Ok(())
    }

    async fn save(&self, exam: &Exam) -> anyhow::Result<()> {
        save(exam, &self.exams);
        Ok(())
    }

    async fn find(&self, exam_id: &ID) -> anyhow::Result<Option<Exam>> {
        Ok(find(exam_id, &self.exams))
    }

    async fn delete(&self, exam_id: &ID) -> anyhow::Result<Option<Exam>> {
        Ok(delete(exam_id, &self.exams))
    }
}
