//! File-based task storage implementation
//!
//! Stores tasks as JSON in a file on disk.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::Task;
use super::repository::TaskRepository;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of tasks
    cache: RwLock<HashMap<Uuid, Task>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tasks: Vec<Task> = serde_json::from_str(&content)?;
            tasks.into_iter().map(|t| (t.id, t)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Persist the cache to disk
    async fn persist(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let tasks: Vec<&Task> = cache.values().collect();
        let content = serde_json::to_string_pretty(&tasks)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        {
            let mut cache = self.cache.write().await;
            if cache.contains_key(&task.id) {
                return Err(Error::InvalidInput(format!(
                    "Task with ID {} already exists",
                    task.id
                )));
            }
            cache.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let cache = self.cache.read().await;
        Ok(cache.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        let mut tasks: Vec<Task> = cache.values().cloned().collect();
        // Sort by created_at ascending (insertion order, best-effort)
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    async fn update(&self, mut task: Task) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }
        task.updated_at = Utc::now();
        {
            let mut cache = self.cache.write().await;
            if !cache.contains_key(&task.id) {
                return Err(Error::TaskNotFound(task.id.to_string()));
            }
            cache.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(&id).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (FileTaskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");
        let store = FileTaskStore::new(&path).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_create_task() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Buy milk");
        let created = store.create(task.clone()).await.unwrap();

        assert_eq!(created.id, task.id);
        assert_eq!(created.title, "Buy milk");
        assert!(!created.completed);

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let (store, _temp) = create_test_store().await;

        for title in ["", "   "] {
            let result = store.create(Task::new(title)).await;
            match result.unwrap_err() {
                Error::InvalidInput(_) => {}
                e => panic!("Expected InvalidInput error, got: {:?}", e),
            }
        }

        // Nothing was persisted
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_task() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Buy milk");
        let id = task.id;
        store.create(task).await.unwrap();

        let retrieved = store.get(id).await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, id);

        // Test non-existent task
        let non_existent = store.get(Uuid::new_v4()).await.unwrap();
        assert!(non_existent.is_none());
    }

    #[tokio::test]
    async fn test_list_insertion_order() {
        let (store, _temp) = create_test_store().await;

        store.create(Task::new("first")).await.unwrap();
        store.create(Task::new("second")).await.unwrap();
        store.create(Task::new("third")).await.unwrap();

        let tasks = store.list().await.unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_update_task() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Original title");
        let id = task.id;
        store.create(task).await.unwrap();

        let mut updated_task = store.get(id).await.unwrap().unwrap();
        updated_task.title = "Updated title".to_string();
        updated_task.completed = true;

        let result = store.update(updated_task).await.unwrap();
        assert_eq!(result.title, "Updated title");
        assert!(result.completed);

        // Verify persistence
        let retrieved = store.get(id).await.unwrap().unwrap();
        assert_eq!(retrieved.title, "Updated title");
        assert!(retrieved.completed);
    }

    #[tokio::test]
    async fn test_update_completed_preserves_title() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Keep me");
        let id = task.id;
        store.create(task).await.unwrap();

        let mut toggled = store.get(id).await.unwrap().unwrap();
        toggled.completed = true;
        store.update(toggled).await.unwrap();

        let retrieved = store.get(id).await.unwrap().unwrap();
        assert_eq!(retrieved.title, "Keep me");
        assert!(retrieved.completed);
    }

    #[tokio::test]
    async fn test_update_nonexistent_task() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Never created");
        let result = store.update(task).await;

        assert!(result.is_err());
        match result.unwrap_err() {
            Error::TaskNotFound(_) => {}
            e => panic!("Expected TaskNotFound error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_delete_task() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Task to delete");
        let id = task.id;
        store.create(task).await.unwrap();

        // Verify task exists
        assert!(store.get(id).await.unwrap().is_some());

        // Delete task
        let deleted = store.delete(id).await.unwrap();
        assert!(deleted);

        // Verify task is gone
        assert!(store.get(id).await.unwrap().is_none());

        // Delete again should return false
        let deleted_again = store.delete(id).await.unwrap();
        assert!(!deleted_again);
    }

    #[tokio::test]
    async fn test_no_resurrection_after_delete() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Short-lived");
        let id = task.id;
        store.create(task.clone()).await.unwrap();
        assert!(store.delete(id).await.unwrap());

        // Updating a deleted task must not bring it back
        let result = store.update(task).await;
        match result.unwrap_err() {
            Error::TaskNotFound(_) => {}
            e => panic!("Expected TaskNotFound error, got: {:?}", e),
        }
        assert!(store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");

        let task_id;

        // Create store and add task
        {
            let store = FileTaskStore::new(&path).await.unwrap();
            let task = Task::new("Persistent task").with_completed(true);
            task_id = task.id;
            store.create(task).await.unwrap();
        }

        // Create new store instance and verify data persisted
        {
            let store = FileTaskStore::new(&path).await.unwrap();
            let task = store.get(task_id).await.unwrap();
            assert!(task.is_some());
            let task = task.unwrap();
            assert_eq!(task.title, "Persistent task");
            assert!(task.completed);
        }
    }

    #[tokio::test]
    async fn test_duplicate_task_error() {
        let (store, _temp) = create_test_store().await;

        let task = Task::new("Buy milk");
        store.create(task.clone()).await.unwrap();

        // Try to create same task again
        let result = store.create(task).await;
        assert!(result.is_err());
        match result.unwrap_err() {
            Error::InvalidInput(msg) => {
                assert!(msg.contains("already exists"));
            }
            e => panic!("Expected InvalidInput error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_duplicate_title_creates_second_task() {
        let (store, _temp) = create_test_store().await;

        store.create(Task::new("Buy milk")).await.unwrap();
        store.create(Task::new("Buy milk")).await.unwrap();

        let tasks = store.list().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_ne!(tasks[0].id, tasks[1].id);
    }
}
